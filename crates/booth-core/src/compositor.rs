//! Compositor: turns a [`BoothState`] into a surface-independent list of draw
//! commands plus the layout cache the next interaction hit-tests against.
//!
//! Rendering is a pure read of the state. Reconciling accessory slots against
//! the current detections happens before this, in [`BoothState::redraw`].

use crate::anchor::{map_anchor, AnchorKind};
use crate::layout::{
    ElementLayout, Handle, HitShape, LayoutCache, TextMeasurer, TrashZone, TEXT_HIT_PADDING, TRASH_RADIUS,
};
use crate::overlay::{AccessorySlot, ElementKey, TextStyle};
use crate::state::BoothState;
use crate::types::{AccessoryKind, CanvasSize, Detection, FaceId, Point};
use serde::Serialize;

const BOX_COLOR: &str = "#00ff00";
const BOX_LINE_WIDTH: f32 = 3.0;
const BOX_LABEL_SIZE: f32 = 16.0;
const BOX_LABEL_LIFT: f32 = 5.0;
const CONFIDENCE_DROP: f32 = 20.0;
const KEYPOINT_COLOR: &str = "#ff0000";
const KEYPOINT_RADIUS: f32 = 3.0;

const SELECTION_COLOR: &str = "#ff9800";
const ACCESSORY_RING_WIDTH: f32 = 4.0;
const TEXT_RECT_WIDTH: f32 = 3.0;
const TEXT_STROKE_WIDTH: f32 = 2.0;
const EMOJI_FONT: &str = "Arial";

/// Accessory body radius and ring radius, as a fraction of font size.
const ACCESSORY_HIT_RATIO: f32 = 0.6;
/// Distance from centre to an accessory's handle, as a fraction of font size.
const ACCESSORY_HANDLE_RATIO: f32 = 0.55;
/// Distance from centre to a text handle, as a fraction of text width.
const TEXT_HANDLE_RATIO: f32 = 0.6;
/// Handle radius as a fraction of font size, floored by the configured minimum.
const HANDLE_SIZE_RATIO: f32 = 0.12;

const FACE_SIZE_RATIO: f32 = 0.9;
const GLASSES_SPAN_RATIO: f32 = 1.6;
const EXTRA_SIZE_RATIO: f32 = 0.5;
const HAT_SIZE_RATIO: f32 = 0.6;

const TRASH_FILL: &str = "rgba(244, 67, 54, 0.8)";
const TRASH_GLYPH: &str = "🗑️";
const TRASH_LABEL: &str = "DELETE";
const TRASH_LABEL_DROP: f32 = 15.0;

/// One primitive on the overlay surface. Coordinates are canvas pixels and
/// rotations radians.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    #[serde(rename_all = "camelCase")]
    Clear { width: f32, height: f32 },
    #[serde(rename_all = "camelCase")]
    StrokeRect { x: f32, y: f32, width: f32, height: f32, color: String, line_width: f32 },
    /// Left-aligned debug text.
    #[serde(rename_all = "camelCase")]
    Label { text: String, x: f32, y: f32, font_size: f32, color: String },
    Dot { x: f32, y: f32, radius: f32, color: String },
    /// Centred, rotated emoji or text. `stroke` is an outline drawn under the fill.
    #[serde(rename_all = "camelCase")]
    Glyph {
        element: ElementKey,
        text: String,
        x: f32,
        y: f32,
        font_size: f32,
        font_family: String,
        rotation: f32,
        fill: String,
        stroke: Option<String>,
        stroke_width: f32,
    },
    #[serde(rename_all = "camelCase")]
    Ring { x: f32, y: f32, radius: f32, color: String, line_width: f32 },
    #[serde(rename_all = "camelCase")]
    SelectionRect { x: f32, y: f32, width: f32, height: f32, color: String, line_width: f32 },
    Handle { x: f32, y: f32, radius: f32 },
    #[serde(rename_all = "camelCase")]
    Trash { x: f32, y: f32, radius: f32, fill: String, glyph: String, label: String, label_x: f32, label_y: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub commands: Vec<DrawCommand>,
    pub layout: LayoutCache,
}

struct Frame<'a> {
    canvas: CanvasSize,
    selection: Option<ElementKey>,
    min_handle_radius: f32,
    measurer: &'a dyn TextMeasurer,
    out: RenderOutput,
}

impl Frame<'_> {
    fn handle_radius(&self, font_size: f32) -> f32 {
        self.min_handle_radius.max(font_size * HANDLE_SIZE_RATIO)
    }

    fn is_selected(&self, key: ElementKey) -> bool {
        self.selection == Some(key)
    }

    fn push(&mut self, command: DrawCommand) {
        self.out.commands.push(command);
    }
}

/// Draw everything for the current state, in a fixed order: face boxes,
/// per-face accessories then face text (in detector order), absolute text,
/// and finally the trash affordance.
pub fn render(state: &BoothState, measurer: &dyn TextMeasurer) -> RenderOutput {
    let mut frame = Frame {
        canvas: state.canvas,
        selection: state.selection,
        min_handle_radius: state.config.min_handle_radius,
        measurer,
        out: RenderOutput::default(),
    };

    frame.push(DrawCommand::Clear { width: state.canvas.width, height: state.canvas.height });

    if state.show_boxes {
        draw_face_boxes(&mut frame, &state.detections);
    }

    for (index, detection) in state.detections.iter().enumerate() {
        let face = detection.resolved_face_id(index);
        let Some(overlays) = state.overlays.face(face) else {
            continue;
        };

        for kind in AccessoryKind::DRAW_ORDER {
            if let Some(slot) = overlays.accessories.get(&kind) {
                draw_accessory(&mut frame, face, kind, slot, detection);
            }
        }

        let anchor = map_anchor(&detection.keypoints, AnchorKind::Text, detection.bounding_box.as_ref(), frame.canvas);
        let base = frame.canvas.to_pixels(anchor.x, anchor.y);
        for (&id, text) in &overlays.texts {
            let t = text.transform;
            let center = Point::new(base.x + t.offset_x, base.y + t.offset_y);
            draw_text(&mut frame, ElementKey::FaceText { face, id }, &text.content, &text.style, center, t.scale, t.rotation);
        }
    }

    for text in state.overlays.absolute_texts() {
        let key = ElementKey::AbsoluteText { id: text.id };
        draw_text(&mut frame, key, &text.content, &text.style, Point::new(text.x, text.y), text.scale, text.rotation);
    }

    if state.show_trash {
        draw_trash(&mut frame);
    }

    frame.out
}

fn draw_face_boxes(frame: &mut Frame<'_>, detections: &[Detection]) {
    for (index, detection) in detections.iter().enumerate() {
        let face = detection.resolved_face_id(index);
        let bbox = detection.bbox_or_default();

        frame.push(DrawCommand::StrokeRect {
            x: bbox.origin_x,
            y: bbox.origin_y,
            width: bbox.width,
            height: bbox.height,
            color: BOX_COLOR.to_string(),
            line_width: BOX_LINE_WIDTH,
        });
        frame.push(DrawCommand::Label {
            text: format!("Face {}", face.saturating_add(1)),
            x: bbox.origin_x,
            y: bbox.origin_y - BOX_LABEL_LIFT,
            font_size: BOX_LABEL_SIZE,
            color: BOX_COLOR.to_string(),
        });
        if let Some(confidence) = detection.confidence.filter(|c| *c > 0.0) {
            frame.push(DrawCommand::Label {
                text: format!("{:.0}%", confidence * 100.0),
                x: bbox.origin_x,
                y: bbox.origin_y + bbox.height + CONFIDENCE_DROP,
                font_size: BOX_LABEL_SIZE,
                color: BOX_COLOR.to_string(),
            });
        }
        for kp in detection.keypoints.iter().filter(|kp| kp.is_finite()) {
            let p = frame.canvas.to_pixels(kp.x, kp.y);
            frame.push(DrawCommand::Dot { x: p.x, y: p.y, radius: KEYPOINT_RADIUS, color: KEYPOINT_COLOR.to_string() });
        }
    }
}

/// Centre, font size and rotation of an accessory for one detection.
fn accessory_geometry(kind: AccessoryKind, slot: &AccessorySlot, detection: &Detection, canvas: CanvasSize) -> (Point, f32, f32) {
    let t = slot.transform;
    let bbox = detection.bbox_or_default();
    let anchor = map_anchor(&detection.keypoints, AnchorKind::Accessory(kind), detection.bounding_box.as_ref(), canvas);
    let base = canvas.to_pixels(anchor.x, anchor.y);
    let offset = |p: Point| Point::new(p.x + t.offset_x, p.y + t.offset_y);

    match kind {
        AccessoryKind::Face => (offset(base), bbox.width.min(bbox.height) * FACE_SIZE_RATIO * t.scale, t.rotation),
        AccessoryKind::Glasses if anchor.is_span() => {
            let a = base;
            let b = canvas.to_pixels(anchor.x2, anchor.y2);
            let mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
            let size = a.distance_to(&b) * GLASSES_SPAN_RATIO * t.scale;
            (offset(mid), size, a.angle_to(&b) + t.rotation)
        }
        AccessoryKind::Extra => (offset(base), bbox.width * EXTRA_SIZE_RATIO * t.scale, t.rotation),
        _ => (offset(base), bbox.width * HAT_SIZE_RATIO * t.scale, t.rotation),
    }
}

fn draw_accessory(frame: &mut Frame<'_>, face: FaceId, kind: AccessoryKind, slot: &AccessorySlot, detection: &Detection) {
    let Some(emoji) = slot.emoji.as_deref() else {
        return;
    };

    let key = ElementKey::Accessory { face, accessory: kind };
    let (center, font_size, rotation) = accessory_geometry(kind, slot, detection, frame.canvas);
    let handle = Handle {
        center: center.offset_polar(rotation, font_size * ACCESSORY_HANDLE_RATIO),
        radius: frame.handle_radius(font_size),
    };

    frame.push(DrawCommand::Glyph {
        element: key,
        text: emoji.to_string(),
        x: center.x,
        y: center.y,
        font_size,
        font_family: EMOJI_FONT.to_string(),
        rotation,
        fill: "#000000".to_string(),
        stroke: None,
        stroke_width: 0.0,
    });

    if frame.is_selected(key) {
        frame.push(DrawCommand::Ring {
            x: center.x,
            y: center.y,
            radius: font_size * ACCESSORY_HIT_RATIO,
            color: SELECTION_COLOR.to_string(),
            line_width: ACCESSORY_RING_WIDTH,
        });
        frame.push(DrawCommand::Handle { x: handle.center.x, y: handle.center.y, radius: handle.radius });
    }

    frame.out.layout.insert(
        key,
        ElementLayout {
            center,
            font_size,
            rotation,
            handle: Some(handle),
            shape: HitShape::Circle { radius: font_size * ACCESSORY_HIT_RATIO },
        },
    );
}

fn draw_text(
    frame: &mut Frame<'_>,
    key: ElementKey,
    content: &str,
    style: &TextStyle,
    center: Point,
    scale: f32,
    rotation: f32,
) {
    if content.is_empty() {
        return;
    }

    let font_size = style.font_size * scale;
    let text_width = frame.measurer.measure(content, font_size, &style.font_family);

    frame.push(DrawCommand::Glyph {
        element: key,
        text: content.to_string(),
        x: center.x,
        y: center.y,
        font_size,
        font_family: style.font_family.clone(),
        rotation,
        fill: style.color.clone(),
        stroke: Some(style.stroke_color().to_string()),
        stroke_width: TEXT_STROKE_WIDTH,
    });

    let mut handle = None;
    if frame.is_selected(key) {
        frame.push(DrawCommand::SelectionRect {
            x: center.x - text_width / 2.0 - TEXT_HIT_PADDING,
            y: center.y - font_size / 2.0 - TEXT_HIT_PADDING,
            width: text_width + 2.0 * TEXT_HIT_PADDING,
            height: font_size + 2.0 * TEXT_HIT_PADDING,
            color: SELECTION_COLOR.to_string(),
            line_width: TEXT_RECT_WIDTH,
        });
        let h = Handle {
            center: center.offset_polar(rotation, text_width * TEXT_HANDLE_RATIO),
            radius: frame.handle_radius(font_size),
        };
        frame.push(DrawCommand::Handle { x: h.center.x, y: h.center.y, radius: h.radius });
        handle = Some(h);
    }

    frame.out.layout.insert(
        key,
        ElementLayout {
            center,
            font_size,
            rotation,
            handle,
            shape: HitShape::Rect {
                half_width: text_width / 2.0 + TEXT_HIT_PADDING,
                half_height: font_size / 2.0 + TEXT_HIT_PADDING,
            },
        },
    );
}

fn draw_trash(frame: &mut Frame<'_>) {
    let zone = TrashZone::for_canvas(frame.canvas);
    let center = zone.center();
    frame.push(DrawCommand::Trash {
        x: center.x,
        y: center.y,
        radius: TRASH_RADIUS,
        fill: TRASH_FILL.to_string(),
        glyph: TRASH_GLYPH.to_string(),
        label: TRASH_LABEL.to_string(),
        label_x: center.x,
        label_y: zone.y + zone.size + TRASH_LABEL_DROP,
    });
}
