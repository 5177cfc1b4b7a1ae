use crate::error::BoothError;
use crate::overlay::TextStyle;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// When the delete affordance is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrashMode {
    /// Shown only while an element is being dragged or resized.
    #[default]
    Auto,
    Always,
    Never,
}

impl TrashMode {
    /// `auto -> always -> never -> auto`.
    pub fn next(self) -> Self {
        match self {
            TrashMode::Auto => TrashMode::Always,
            TrashMode::Always => TrashMode::Never,
            TrashMode::Never => TrashMode::Auto,
        }
    }
}

impl FromStr for TrashMode {
    type Err = BoothError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(TrashMode::Auto),
            "always" => Ok(TrashMode::Always),
            "never" => Ok(TrashMode::Never),
            other => Err(BoothError::UnknownTrashMode(other.to_string())),
        }
    }
}

/// Tunables for a booth session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoothConfig {
    /// Style given to new text before the user picks anything.
    pub text_style: TextStyle,
    pub trash_mode: TrashMode,
    /// Draw detector boxes, labels and keypoints.
    pub show_boxes: bool,
    /// Lower bound for resize handle radius in pixels.
    pub min_handle_radius: f32,
    /// Evict a face's overlays after this many consecutive passes without it.
    /// `None` keeps them forever.
    pub evict_after_frames: Option<u32>,
    /// Hand every capture to the upload collaborator straight away.
    pub auto_upload: bool,
    pub brush_color: String,
    pub brush_size: f32,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            text_style: TextStyle::default(),
            trash_mode: TrashMode::Auto,
            show_boxes: false,
            min_handle_radius: 28.0,
            evict_after_frames: None,
            auto_upload: true,
            brush_color: "#000000".to_string(),
            brush_size: 10.0,
        }
    }
}
