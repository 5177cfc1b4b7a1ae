//! Freehand drawing layer, kept as vector strokes so capture can rasterize
//! them at the video's native resolution.

use crate::types::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    /// Brush diameter in pixels.
    pub width: f32,
    /// A single point is a dot.
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawingLayer {
    strokes: Vec<Stroke>,
    #[serde(skip)]
    active: bool,
}

impl DrawingLayer {
    /// Start a stroke with a dot under the pointer.
    pub fn begin(&mut self, at: Point, color: &str, width: f32) {
        self.strokes.push(Stroke { color: color.to_string(), width, points: vec![at] });
        self.active = true;
    }

    /// Extend the active stroke; ignored when no stroke is in progress.
    pub fn extend(&mut self, to: Point) {
        if !self.active {
            return;
        }
        if let Some(stroke) = self.strokes.last_mut() {
            stroke.points.push(to);
        }
    }

    pub fn end(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.active = false;
    }

    pub fn has_drawing(&self) -> bool {
        !self.strokes.is_empty()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }
}
