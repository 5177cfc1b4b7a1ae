//! Interaction scripts: a recorded sequence of booth events replayed against `BoothState`.

use anyhow::{bail, Context, Result};
use booth_core::filter::{self, FilterInterpreter};
use booth_core::text_command::{self, TextInterpreter};
use booth_core::{
    AccessoryKind, BoothState, CanvasSize, Detection, DrawCommand, ElementKey, Filter, Point, Release, TextEdit,
    TrashMode,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default)]
    pub canvas: Option<CanvasSize>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Step {
    /// One detector result; reconciles and redraws.
    Detect { detections: Vec<Detection> },
    SelectAccessory { kind: AccessoryKind, emoji: Option<String> },
    /// Free-text command, e.g. "write 'boss' above my head".
    Text { command: String },
    Haiku { text: String },
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    #[serde(rename_all = "camelCase")]
    Wheel { delta_y: f32 },
    DoubleClick { x: f32, y: f32 },
    #[serde(rename_all = "camelCase")]
    Edit {
        content: String,
        color: Option<String>,
        font_size: Option<f32>,
        font_family: Option<String>,
    },
    CancelEdit,
    DeleteSelected,
    CycleTrash,
    ShowBoxes { show: bool },
    ToggleDrawing,
    Draw { points: Vec<Point>, color: Option<String>, size: Option<f32> },
    Filter { name: String },
    DescribeFilter { description: String },
    TextColor { color: String },
    TextSize { size: f32 },
    TextFont { font: String },
    ClearText,
    ClearAccessories,
    ClearDrawing,
    ClearAll,
}

/// What one step did, for the replay log.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLog {
    pub index: usize,
    pub action: String,
    pub outcome: String,
}

/// Final state after a replay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub steps: Vec<StepLog>,
    pub selection: Option<ElementKey>,
    pub trash_mode: TrashMode,
    pub trash_visible: bool,
    pub filter: Filter,
    pub text_count: usize,
    pub has_drawing: bool,
    pub commands: Vec<DrawCommand>,
}

impl Script {
    /// Load from JSON or TOML, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw).with_context(|| format!("parsing {}", path.display())),
            Some("json") | None => serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display())),
            Some(other) => bail!("unsupported script format: .{other}"),
        }
    }
}

/// Collaborators available during replay. Both are optional; without them
/// the local fallbacks run.
#[derive(Default)]
pub struct Collaborators<'a> {
    pub text: Option<&'a dyn TextInterpreter>,
    pub filter: Option<&'a dyn FilterInterpreter>,
}

pub fn replay(state: &mut BoothState, steps: &[Step], collaborators: &Collaborators) -> ReplayReport {
    let mut logs = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let outcome = apply(state, step, collaborators);
        tracing::debug!(index, step = ?step, outcome = %outcome, "step replayed");
        logs.push(StepLog { index, action: action_name(step).to_string(), outcome });
    }
    state.redraw();
    ReplayReport {
        steps: logs,
        selection: state.selection(),
        trash_mode: state.trash_mode(),
        trash_visible: state.is_trash_visible(),
        filter: state.filter(),
        text_count: state.overlays().text_count(),
        has_drawing: state.drawing().has_drawing(),
        commands: state.last_frame().to_vec(),
    }
}

fn apply(state: &mut BoothState, step: &Step, collaborators: &Collaborators) -> String {
    match step {
        Step::Detect { detections } => {
            state.set_detections(detections.clone());
            state.redraw();
            format!("{} face(s)", detections.len())
        }
        Step::SelectAccessory { kind, emoji } => {
            state.select_accessory(*kind, emoji.clone());
            format!("{kind:?} = {}", emoji.as_deref().unwrap_or("off"))
        }
        Step::Text { command } => {
            let parsed = text_command::interpret(collaborators.text, command, state.style());
            describe(state.add_text(parsed).map(|key| format!("added {key:?}")))
        }
        Step::Haiku { text } => {
            state.set_haiku(Some(text.clone()));
            describe(state.add_haiku().map(|key| format!("added {key:?}")))
        }
        Step::PointerDown { x, y } => match state.pointer_down(Point::new(*x, *y)) {
            Some(hit) => format!("hit {:?} ({:?})", hit.key, hit.target),
            None => "miss".to_string(),
        },
        Step::PointerMove { x, y } => {
            let moved = state.pointer_move(Point::new(*x, *y));
            if moved { "moved" } else { "idle" }.to_string()
        }
        Step::PointerUp { x, y } => match state.pointer_up(Point::new(*x, *y)) {
            Release::Deleted(key) => format!("deleted {key:?}"),
            Release::Released(key) => format!("released {key:?}"),
            Release::Idle => "idle".to_string(),
        },
        Step::Wheel { delta_y } => {
            let scaled = state.wheel(*delta_y);
            if scaled { "scaled" } else { "nothing selected" }.to_string()
        }
        Step::DoubleClick { x, y } => match state.double_click(Point::new(*x, *y)) {
            Some(session) => format!("editing {:?}", session.key),
            None => "no text here".to_string(),
        },
        Step::Edit { content, color, font_size, font_family } => {
            let Some(session) = state.edit().cloned() else {
                return "no active edit".to_string();
            };
            let edit = TextEdit {
                content: content.clone(),
                color: color.clone().unwrap_or(session.color),
                font_size: font_size.unwrap_or(session.font_size),
                font_family: font_family.clone().unwrap_or(session.font_family),
            };
            describe(state.apply_edit(edit).map(|()| format!("edited {:?}", session.key)))
        }
        Step::CancelEdit => {
            state.cancel_edit();
            "cancelled".to_string()
        }
        Step::DeleteSelected => match state.selection() {
            Some(key) => describe(state.delete_element(key).map(|()| format!("deleted {key:?}"))),
            None => "nothing selected".to_string(),
        },
        Step::CycleTrash => format!("trash {:?}", state.cycle_trash_mode()),
        Step::ShowBoxes { show } => {
            state.set_show_boxes(*show);
            format!("boxes {show}")
        }
        Step::ToggleDrawing => format!("drawing mode {}", state.toggle_drawing_mode()),
        Step::Draw { points, color, size } => {
            if !state.is_drawing_mode() {
                return "not in drawing mode".to_string();
            }
            if color.is_some() || size.is_some() {
                let color = color.clone().unwrap_or_else(|| state.config().brush_color.clone());
                let size = size.unwrap_or(state.config().brush_size);
                state.set_brush(&color, size);
            }
            let mut points = points.iter();
            let Some(first) = points.next() else {
                return "empty stroke".to_string();
            };
            state.drawing_start(*first);
            for p in points {
                state.drawing_move(*p);
            }
            state.drawing_end();
            "stroke drawn".to_string()
        }
        Step::Filter { name } => match name.parse::<Filter>() {
            Ok(f) => {
                state.set_filter(f);
                format!("filter {f}")
            }
            Err(e) => format!("error: {e}"),
        },
        Step::DescribeFilter { description } => {
            let choice = filter::resolve_filter(collaborators.filter, description);
            state.set_filter(choice.filter);
            let source = if choice.fell_back { "local" } else { "collaborator" };
            format!("filter {} ({source})", choice.filter)
        }
        Step::TextColor { color } => {
            state.set_text_color(color);
            format!("color {color}")
        }
        Step::TextSize { size } => {
            state.set_text_size(*size);
            format!("size {}", state.style().font_size)
        }
        Step::TextFont { font } => {
            state.set_text_font(font);
            format!("font {font}")
        }
        Step::ClearText => {
            state.clear_text();
            "text cleared".to_string()
        }
        Step::ClearAccessories => {
            state.clear_accessories();
            "accessories cleared".to_string()
        }
        Step::ClearDrawing => {
            state.clear_drawing();
            "drawing cleared".to_string()
        }
        Step::ClearAll => {
            state.clear_all();
            "all cleared".to_string()
        }
    }
}

fn describe<E: std::fmt::Display>(result: std::result::Result<String, E>) -> String {
    result.unwrap_or_else(|e| format!("error: {e}"))
}

fn action_name(step: &Step) -> &'static str {
    match step {
        Step::Detect { .. } => "detect",
        Step::SelectAccessory { .. } => "selectAccessory",
        Step::Text { .. } => "text",
        Step::Haiku { .. } => "haiku",
        Step::PointerDown { .. } => "pointerDown",
        Step::PointerMove { .. } => "pointerMove",
        Step::PointerUp { .. } => "pointerUp",
        Step::Wheel { .. } => "wheel",
        Step::DoubleClick { .. } => "doubleClick",
        Step::Edit { .. } => "edit",
        Step::CancelEdit => "cancelEdit",
        Step::DeleteSelected => "deleteSelected",
        Step::CycleTrash => "cycleTrash",
        Step::ShowBoxes { .. } => "showBoxes",
        Step::ToggleDrawing => "toggleDrawing",
        Step::Draw { .. } => "draw",
        Step::Filter { .. } => "filter",
        Step::DescribeFilter { .. } => "describeFilter",
        Step::TextColor { .. } => "textColor",
        Step::TextSize { .. } => "textSize",
        Step::TextFont { .. } => "textFont",
        Step::ClearText => "clearText",
        Step::ClearAccessories => "clearAccessories",
        Step::ClearDrawing => "clearDrawing",
        Step::ClearAll => "clearAll",
    }
}
