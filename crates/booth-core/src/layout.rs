//! Per-frame layout results used for hit-testing.
//!
//! The compositor produces a fresh [`LayoutCache`] on every render. Interaction
//! handlers read it but never write it, and an element missing from the cache
//! (not drawn this frame) is simply not hittable.

use crate::overlay::ElementKey;
use crate::types::{CanvasSize, Point};
use serde::Serialize;

/// Distance from the right and bottom canvas edges to the trash zone's top-left corner.
pub const TRASH_MARGIN: f32 = 90.0;
/// Side length of the square trash hit zone.
pub const TRASH_SIZE: f32 = 70.0;
/// Radius of the drawn trash circle.
pub const TRASH_RADIUS: f32 = 30.0;
/// Padding added around text bounds for body hits and the selection rectangle.
pub const TEXT_HIT_PADDING: f32 = 5.0;

/// Text width oracle; the compositor has no font rasterizer of its own.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: f32, font_family: &str) -> f32;
}

/// Fixed advance per character, good enough for layout without a font stack.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasurer {
    /// Character advance as a fraction of the font size.
    pub advance_ratio: f32,
}

impl Default for ApproxTextMeasurer {
    fn default() -> Self {
        Self { advance_ratio: 0.55 }
    }
}

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, text: &str, font_size: f32, _font_family: &str) -> f32 {
        text.chars().count() as f32 * font_size * self.advance_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    pub center: Point,
    pub radius: f32,
}

impl Handle {
    pub fn contains(&self, p: Point) -> bool {
        self.center.distance_to(&p) < self.radius
    }
}

/// Body hit area around an element's centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum HitShape {
    Circle { radius: f32 },
    /// Axis-aligned, ignoring rotation.
    Rect { half_width: f32, half_height: f32 },
}

/// Where and how big an element was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementLayout {
    pub center: Point,
    pub font_size: f32,
    pub rotation: f32,
    /// `None` when the element currently exposes no resize handle.
    pub handle: Option<Handle>,
    pub shape: HitShape,
}

impl ElementLayout {
    pub fn body_contains(&self, p: Point) -> bool {
        match self.shape {
            HitShape::Circle { radius } => self.center.distance_to(&p) < radius,
            HitShape::Rect { half_width, half_height } => {
                (p.x - self.center.x).abs() < half_width && (p.y - self.center.y).abs() < half_height
            }
        }
    }

    pub fn handle_contains(&self, p: Point) -> bool {
        self.handle.is_some_and(|h| h.contains(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub key: ElementKey,
    pub target: HitTarget,
}

/// Layout of every element drawn in the last frame, in draw order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutCache {
    entries: Vec<(ElementKey, ElementLayout)>,
}

impl LayoutCache {
    /// Record a layout, replacing any earlier entry for the same key.
    pub fn insert(&mut self, key: ElementKey, layout: ElementLayout) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = layout,
            None => self.entries.push((key, layout)),
        }
    }

    pub fn get(&self, key: ElementKey) -> Option<&ElementLayout> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, l)| l)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementKey, &ElementLayout)> {
        self.entries.iter().map(|(k, l)| (*k, l))
    }

    /// Absolute text first, then face-anchored elements in draw order.
    fn hit_order(&self) -> impl Iterator<Item = (ElementKey, &ElementLayout)> {
        let absolute = self.iter().filter(|(k, _)| matches!(k, ElementKey::AbsoluteText { .. }));
        let anchored = self.iter().filter(|(k, _)| !matches!(k, ElementKey::AbsoluteText { .. }));
        absolute.chain(anchored)
    }

    /// Handles win over bodies; within each pass the first match wins.
    pub fn hit_test(&self, p: Point) -> Option<Hit> {
        if let Some((key, _)) = self.hit_order().find(|(_, l)| l.handle_contains(p)) {
            return Some(Hit { key, target: HitTarget::Handle });
        }
        self.hit_order()
            .find(|(_, l)| l.body_contains(p))
            .map(|(key, _)| Hit { key, target: HitTarget::Body })
    }

    /// Body hit restricted to text elements.
    pub fn hit_text(&self, p: Point) -> Option<ElementKey> {
        self.hit_order()
            .find(|(k, l)| k.is_text() && l.body_contains(p))
            .map(|(key, _)| key)
    }

    pub fn over_handle(&self, p: Point) -> bool {
        self.entries.iter().any(|(_, l)| l.handle_contains(p))
    }
}

/// Fixed square delete zone near the bottom-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrashZone {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl TrashZone {
    pub fn for_canvas(canvas: CanvasSize) -> Self {
        Self { x: canvas.width - TRASH_MARGIN, y: canvas.height - TRASH_MARGIN, size: TRASH_SIZE }
    }

    /// Edges are inclusive.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.size && p.y >= self.y && p.y <= self.y + self.size
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.size / 2.0, self.y + self.size / 2.0)
    }
}
