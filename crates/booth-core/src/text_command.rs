//! Text commands ("put 'hello' above my head") turned into placement and style.
//!
//! A hosted language model may interpret the command; whatever it returns is
//! validated, and any failure falls back to the local keyword parser so adding
//! text never fails because of the collaborator.

use crate::overlay::TextStyle;
use crate::types::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Face-relative offset used when the command names no position.
pub const DEFAULT_FACE_OFFSET: Point = Point { x: 0.0, y: -60.0 };

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpretError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("malformed collaborator response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPlacement {
    #[serde(rename = "absolute")]
    Absolute,
    #[serde(rename = "face-relative")]
    FaceRelative,
}

/// A fully resolved text command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedText {
    pub content: String,
    pub placement: TextPlacement,
    pub target_face: Option<usize>,
    /// Pixel offset from the face anchor; ignored for absolute placement.
    pub offset: Point,
    pub position_description: String,
    pub font_family: String,
    pub color: String,
    pub font_size: f32,
}

impl ParsedText {
    pub fn style(&self) -> TextStyle {
        TextStyle {
            color: self.color.clone(),
            font_size: self.font_size,
            font_family: self.font_family.clone(),
        }
    }
}

/// Raw reply of the text-parsing collaborator. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSuggestion {
    pub content: Option<String>,
    pub target_face: Option<usize>,
    pub position: Option<String>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    pub position_description: Option<String>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub font_size: Option<f32>,
}

impl TextSuggestion {
    pub fn from_json(body: &str) -> Result<Self, InterpretError> {
        serde_json::from_str(body).map_err(|e| InterpretError::Malformed(e.to_string()))
    }
}

/// Hosted interpreter for free-text commands.
pub trait TextInterpreter {
    fn interpret(&self, command: &str) -> Result<TextSuggestion, InterpretError>;
}

/// Offset and description for position words in `command`.
pub fn keyword_offset(command: &str) -> (Point, &'static str) {
    let text = command.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

    if has(&["left of"]) {
        (Point::new(-80.0, 0.0), "left of")
    } else if has(&["right of"]) {
        (Point::new(80.0, 0.0), "right of")
    } else if has(&["below", "under", "bottom of"]) {
        (Point::new(0.0, 60.0), "below")
    } else if has(&["above", "over", "top of"]) {
        (Point::new(0.0, -80.0), "above")
    } else if has(&[" on ", " at "]) {
        (Point::new(0.0, 0.0), "on")
    } else {
        (DEFAULT_FACE_OFFSET, "above")
    }
}

/// First non-empty run of characters between two quote marks.
fn quoted_content(command: &str) -> Option<&str> {
    let quotes: Vec<usize> = command
        .char_indices()
        .filter(|(_, c)| *c == '\'' || *c == '"')
        .map(|(i, _)| i)
        .collect();
    quotes
        .windows(2)
        .map(|w| &command[w[0] + 1..w[1]])
        .find(|s| !s.is_empty())
}

/// Keyword-only interpretation. Mentions of a face or head anchor the text to
/// face 0; anything else lands at the top-left as absolute text.
pub fn parse_locally(command: &str, defaults: &TextStyle) -> ParsedText {
    let lower = command.to_lowercase();
    let (offset, description) = keyword_offset(command);
    let face_relative = lower.contains("face") || lower.contains("head");

    let content = if face_relative {
        quoted_content(command).unwrap_or(command).to_string()
    } else {
        command.to_string()
    };

    ParsedText {
        content,
        placement: if face_relative { TextPlacement::FaceRelative } else { TextPlacement::Absolute },
        target_face: face_relative.then_some(0),
        offset,
        position_description: description.to_string(),
        font_family: defaults.font_family.clone(),
        color: defaults.color.clone(),
        font_size: defaults.font_size,
    }
}

fn from_suggestion(s: TextSuggestion, command: &str, defaults: &TextStyle) -> Result<ParsedText, InterpretError> {
    let placement = match s.position.as_deref() {
        None | Some("absolute") => TextPlacement::Absolute,
        Some("face-relative") => TextPlacement::FaceRelative,
        Some(other) => return Err(InterpretError::Malformed(format!("unknown position {other:?}"))),
    };

    let (offset, description) = match (s.offset_x, s.offset_y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (
            Point::new(x, y),
            s.position_description.unwrap_or_else(|| "AI-positioned".to_string()),
        ),
        (Some(_), Some(_)) => return Err(InterpretError::Malformed("non-finite offset".to_string())),
        _ => {
            let (offset, description) = keyword_offset(command);
            (offset, description.to_string())
        }
    };

    Ok(ParsedText {
        content: s.content.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| command.to_string()),
        placement,
        target_face: s.target_face,
        offset,
        position_description: description,
        font_family: s.font_family.unwrap_or_else(|| defaults.font_family.clone()),
        color: s.color.unwrap_or_else(|| defaults.color.clone()),
        font_size: s.font_size.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(defaults.font_size),
    })
}

/// Interpret `command`, preferring the collaborator and falling back locally.
pub fn interpret(interpreter: Option<&dyn TextInterpreter>, command: &str, defaults: &TextStyle) -> ParsedText {
    let Some(interpreter) = interpreter else {
        return parse_locally(command, defaults);
    };

    match interpreter.interpret(command).and_then(|s| from_suggestion(s, command, defaults)) {
        Ok(parsed) => {
            tracing::debug!(content = %parsed.content, placement = ?parsed.placement, "text command interpreted");
            parsed
        }
        Err(e) => {
            tracing::warn!(error = %e, "text interpretation failed; falling back to simple parsing");
            parse_locally(command, defaults)
        }
    }
}
