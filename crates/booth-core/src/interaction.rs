//! Pointer, wheel and double-click handling on the overlay surface, plus the
//! freehand drawing handlers used while drawing mode is on.
//!
//! Hit-tests only consult the layout cache from the last redraw, so anything
//! not drawn in that frame is a miss.

use crate::config::TrashMode;
use crate::error::BoothError;
use crate::layout::{Hit, HitTarget, TrashZone};
use crate::overlay::{ElementKey, Placement};
use crate::state::BoothState;
use crate::types::{CanvasSize, Point};
use serde::Serialize;

/// Scale change per wheel notch.
pub const WHEEL_STEP: f32 = 0.1;

/// In-flight pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        key: ElementKey,
        /// Offset (or absolute position) when the drag began.
        start: Point,
        /// Element centre on screen when the drag began.
        center: Point,
    },
    Resizing {
        key: ElementKey,
        center: Point,
        position: Point,
        start_dist: f32,
        start_angle: f32,
        start_scale: f32,
        start_rotation: f32,
    },
}

/// What a pointer-up did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The element was dropped on the trash and removed.
    Deleted(ElementKey),
    /// The gesture ended; the element stays selected.
    Released(ElementKey),
    /// No gesture was active.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    Default,
    Pointer,
    Resize,
}

/// An open text edit, pre-populated from the element being edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    pub key: ElementKey,
    pub content: String,
    pub color: String,
    pub font_size: f32,
    pub font_family: String,
}

/// Values submitted from the edit affordance.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEdit {
    pub content: String,
    pub color: String,
    pub font_size: f32,
    pub font_family: String,
}

impl BoothState {
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Convert a client-space pointer position to canvas pixels.
    pub fn to_canvas(&self, client: Point, display_origin: Point, display: CanvasSize) -> Point {
        self.canvas.client_to_canvas(client, display_origin, display)
    }

    fn over_trash(&self, p: Point) -> bool {
        self.show_trash && self.trash_mode != TrashMode::Never && TrashZone::for_canvas(self.canvas).contains(p)
    }

    /// Start a drag or resize on whatever is under `p`. A miss clears the selection.
    pub fn pointer_down(&mut self, p: Point) -> Option<Hit> {
        if self.drawing_mode {
            return None;
        }

        let target = self.layout.hit_test(p).and_then(|hit| {
            let layout = self.layout.get(hit.key).copied()?;
            let placement = self.overlays.placement(hit.key)?;
            Some((hit, layout, placement))
        });

        let Some((hit, layout, placement)) = target else {
            self.selection = None;
            self.gesture = Gesture::Idle;
            self.redraw();
            return None;
        };

        self.gesture = match hit.target {
            HitTarget::Handle => Gesture::Resizing {
                key: hit.key,
                center: layout.center,
                position: placement.position,
                start_dist: layout.center.distance_to(&p),
                start_angle: layout.center.angle_to(&p),
                start_scale: placement.scale,
                start_rotation: placement.rotation,
            },
            HitTarget::Body => Gesture::Dragging { key: hit.key, start: placement.position, center: layout.center },
        };
        tracing::debug!(element = ?hit.key, target = ?hit.target, "gesture started");

        self.select(Some(hit.key));
        if self.trash_mode == TrashMode::Auto {
            self.show_trash = true;
        }
        self.redraw();
        Some(hit)
    }

    /// Continue the active gesture. Returns false when nothing moved.
    pub fn pointer_move(&mut self, p: Point) -> bool {
        if self.drawing_mode {
            return false;
        }

        let gesture = self.gesture;
        let (key, placement) = match gesture {
            Gesture::Idle => return false,
            Gesture::Resizing { key, center, position, start_dist, start_angle, start_scale, start_rotation } => {
                let base = if start_dist > 0.0 { start_dist } else { 1.0 };
                let scale = start_scale * (center.distance_to(&p) / base);
                let rotation = start_rotation + (center.angle_to(&p) - start_angle);
                (key, Placement { position, scale, rotation })
            }
            Gesture::Dragging { key, start, center } => {
                let Some(current) = self.overlays.placement(key) else {
                    self.gesture = Gesture::Idle;
                    return false;
                };
                let position = Point::new(start.x + (p.x - center.x), start.y + (p.y - center.y));
                (key, Placement { position, ..current })
            }
        };

        if !self.overlays.set_placement(key, placement) {
            self.gesture = Gesture::Idle;
            return false;
        }
        self.redraw();
        true
    }

    /// End the active gesture, deleting the element when dropped on a visible trash.
    pub fn pointer_up(&mut self, p: Point) -> Release {
        let key = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {
                self.redraw();
                return Release::Idle;
            }
            Gesture::Dragging { key, .. } | Gesture::Resizing { key, .. } => key,
        };

        let dropped = self.over_trash(p);
        if self.trash_mode == TrashMode::Auto {
            self.show_trash = false;
        }

        if dropped {
            if let Err(e) = self.remove_element(key) {
                tracing::warn!(error = %e, "dropped element was already gone");
            }
            self.selection = None;
            self.redraw();
            return Release::Deleted(key);
        }

        self.redraw();
        Release::Released(key)
    }

    /// Nudge the selected element's scale: wheel up grows, wheel down shrinks.
    pub fn wheel(&mut self, delta_y: f32) -> bool {
        if self.drawing_mode {
            return false;
        }
        let Some(key) = self.selection else {
            return false;
        };
        let Some(placement) = self.overlays.placement(key) else {
            return false;
        };

        let step = if delta_y < 0.0 { WHEEL_STEP } else { -WHEEL_STEP };
        self.overlays.set_placement(key, Placement { scale: placement.scale + step, ..placement });
        self.redraw();
        true
    }

    /// Open an edit session on the text under `p`, if any.
    pub fn double_click(&mut self, p: Point) -> Option<&EditSession> {
        if self.drawing_mode {
            return None;
        }
        let key = self.layout.hit_text(p)?;
        let (content, style) = self.overlays.text(key)?;
        self.edit = Some(EditSession {
            key,
            content: content.to_string(),
            color: style.color.clone(),
            font_size: style.font_size,
            font_family: style.font_family.clone(),
        });
        tracing::debug!(element = ?key, "editing text");
        self.selection = Some(key);
        self.redraw();
        self.edit.as_ref()
    }

    /// Apply an edit to the element the session was opened on, then close it.
    /// Empty content is rejected and leaves the session open.
    pub fn apply_edit(&mut self, edit: TextEdit) -> Result<(), BoothError> {
        let key = self.edit.as_ref().map(|e| e.key).ok_or(BoothError::NoActiveEdit)?;
        let content = edit.content.trim();
        if content.is_empty() {
            return Err(BoothError::EmptyTextContent);
        }

        let Some((text, style)) = self.overlays.text_mut(key) else {
            self.cancel_edit();
            return Err(BoothError::ElementNotFound(key));
        };
        *text = content.to_string();
        style.color = edit.color;
        if edit.font_size.is_finite() && edit.font_size > 0.0 {
            style.font_size = edit.font_size;
        }
        style.font_family = edit.font_family;

        tracing::info!(element = ?key, "text edited");
        self.cancel_edit();
        Ok(())
    }

    /// Close the edit session and drop the selection.
    pub fn cancel_edit(&mut self) {
        self.edit = None;
        self.selection = None;
        self.redraw();
    }

    /// Cursor to show while hovering at `p`. Does not change any state.
    pub fn cursor_at(&self, p: Point) -> Cursor {
        if self.over_trash(p) {
            Cursor::Pointer
        } else if self.layout.over_handle(p) {
            Cursor::Resize
        } else {
            Cursor::Default
        }
    }

    pub fn drawing_start(&mut self, p: Point) {
        if self.drawing_mode {
            self.drawing.begin(p, &self.brush_color, self.brush_size);
        }
    }

    pub fn drawing_move(&mut self, p: Point) {
        if self.drawing_mode {
            self.drawing.extend(p);
        }
    }

    pub fn drawing_end(&mut self) {
        self.drawing.end();
    }
}
