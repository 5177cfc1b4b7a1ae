//! Colour filter catalogue and description-to-filter resolution.

use crate::error::BoothError;
use crate::text_command::InterpretError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One CSS filter primitive. Amounts follow CSS semantics (1.0 = 100%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    Sepia(f32),
    Grayscale(f32),
    Contrast(f32),
    Brightness(f32),
    Saturate(f32),
    /// Degrees.
    HueRotate(f32),
    /// Gaussian standard deviation in pixels.
    Blur(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    None,
    Sepia,
    Grayscale,
    Vintage,
    Warm,
    Cool,
    Dramatic,
    Dreamy,
}

impl Filter {
    pub const ALL: [Filter; 8] = [
        Filter::None,
        Filter::Sepia,
        Filter::Grayscale,
        Filter::Vintage,
        Filter::Warm,
        Filter::Cool,
        Filter::Dramatic,
        Filter::Dreamy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Filter::None => "none",
            Filter::Sepia => "sepia",
            Filter::Grayscale => "grayscale",
            Filter::Vintage => "vintage",
            Filter::Warm => "warm",
            Filter::Cool => "cool",
            Filter::Dramatic => "dramatic",
            Filter::Dreamy => "dreamy",
        }
    }

    /// The primitive chain, applied left to right.
    pub fn ops(&self) -> &'static [FilterOp] {
        use FilterOp::*;
        match self {
            Filter::None => &[],
            Filter::Sepia => &[Sepia(1.0), Contrast(1.15), Brightness(1.1), Saturate(1.2)],
            Filter::Grayscale => &[Grayscale(1.0), Contrast(1.2), Brightness(1.05)],
            Filter::Vintage => &[Sepia(0.6), Contrast(1.3), Brightness(1.15), HueRotate(-15.0), Saturate(1.4)],
            Filter::Warm => &[HueRotate(-20.0), Saturate(1.4), Brightness(1.15), Contrast(1.1)],
            Filter::Cool => &[HueRotate(20.0), Saturate(1.3), Brightness(1.08), Contrast(1.15)],
            Filter::Dramatic => &[Contrast(1.6), Brightness(0.95), Saturate(1.4)],
            Filter::Dreamy => &[Blur(0.8), Brightness(1.25), Saturate(0.85), Contrast(0.9), HueRotate(5.0)],
        }
    }

    /// CSS `filter` property value for live preview.
    pub fn css(&self) -> String {
        let ops = self.ops();
        if ops.is_empty() {
            return "none".to_string();
        }
        ops.iter()
            .map(|op| match op {
                FilterOp::Sepia(v) => format!("sepia({v})"),
                FilterOp::Grayscale(v) => format!("grayscale({v})"),
                FilterOp::Contrast(v) => format!("contrast({v})"),
                FilterOp::Brightness(v) => format!("brightness({v})"),
                FilterOp::Saturate(v) => format!("saturate({v})"),
                FilterOp::HueRotate(v) => format!("hue-rotate({v}deg)"),
                FilterOp::Blur(v) => format!("blur({v}px)"),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Filter::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| BoothError::UnknownFilter(s.to_string()))
    }
}

/// Reply of the hosted filter-description collaborator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterSuggestion {
    pub filter: String,
    #[serde(default)]
    pub interpretation: String,
}

/// Maps a free-text mood description to a filter name.
pub trait FilterInterpreter {
    fn describe(&self, description: &str) -> Result<FilterSuggestion, InterpretError>;
}

/// Outcome of resolving a description to a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChoice {
    pub filter: Filter,
    pub interpretation: String,
    /// True when the local keyword heuristic produced the answer.
    pub fell_back: bool,
}

const FILTER_KEYWORDS: &[(Filter, &[&str])] = &[
    (Filter::Grayscale, &["black and white", "b&w", "noir", "mono", "gray", "grey"]),
    (Filter::Warm, &["warm", "sunset", "golden", "cozy", "summer"]),
    (Filter::Cool, &["cool", "cold", "ice", "icy", "blue", "winter"]),
    (Filter::Dramatic, &["dramatic", "intense", "bold", "contrast", "moody"]),
    (Filter::Dreamy, &["dream", "soft", "hazy", "ethereal", "glow"]),
    (Filter::Vintage, &["vintage", "retro", "old", "70s", "film", "nostalg"]),
    (Filter::Sepia, &["sepia", "antique", "brown", "western"]),
];

/// Pick a filter from keywords in `description`; `Filter::None` when nothing matches.
pub fn derive_filter_locally(description: &str) -> Filter {
    let text = description.to_lowercase();
    FILTER_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(filter, _)| *filter)
        .unwrap_or_default()
}

/// Resolve a description through the collaborator when present, falling back
/// to the keyword heuristic on any failure or unknown filter name.
pub fn resolve_filter(interpreter: Option<&dyn FilterInterpreter>, description: &str) -> FilterChoice {
    if let Some(interpreter) = interpreter {
        match interpreter.describe(description) {
            Ok(suggestion) => match suggestion.filter.parse::<Filter>() {
                Ok(filter) => {
                    return FilterChoice { filter, interpretation: suggestion.interpretation, fell_back: false };
                }
                Err(e) => tracing::warn!(error = %e, "filter collaborator returned an unknown filter; falling back"),
            },
            Err(e) => tracing::warn!(error = %e, "filter collaborator failed; falling back"),
        }
    }

    let filter = derive_filter_locally(description);
    FilterChoice {
        filter,
        interpretation: format!("matched \"{description}\" to {filter} by keyword"),
        fell_back: true,
    }
}
