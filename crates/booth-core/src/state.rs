//! The booth's whole mutable state in one place.

use crate::compositor::{render, DrawCommand};
use crate::config::{BoothConfig, TrashMode};
use crate::drawing::DrawingLayer;
use crate::error::BoothError;
use crate::filter::Filter;
use crate::interaction::{EditSession, Gesture};
use crate::layout::{ApproxTextMeasurer, LayoutCache, TextMeasurer};
use crate::overlay::{AccessorySelection, ElementKey, OverlayStore, TextStyle};
use crate::text_command::{ParsedText, TextPlacement};
use crate::types::{AccessoryKind, CanvasSize, Detection, FaceId, Point};

/// Where absolute text lands when first added.
pub const DEFAULT_TEXT_POSITION: Point = Point { x: 50.0, y: 50.0 };
/// Haiku position as fractions of the canvas size.
const HAIKU_POSITION: (f32, f32) = (0.75, 0.8);
const HAIKU_SIZE_REDUCTION: f32 = 8.0;
const HAIKU_MIN_SIZE: f32 = 16.0;

/// Detections, overlay store, selection, UI flags and the last frame's layout.
///
/// All writes go through `&mut self` methods; [`BoothState::redraw`] is the
/// only place layout is recomputed.
pub struct BoothState {
    pub(crate) config: BoothConfig,
    pub(crate) canvas: CanvasSize,
    pub(crate) detections: Vec<Detection>,
    pub(crate) overlays: OverlayStore,
    pub(crate) accessories: AccessorySelection,
    /// Style panel values, used for new text.
    pub(crate) style: TextStyle,
    pub(crate) selection: Option<ElementKey>,
    pub(crate) gesture: Gesture,
    pub(crate) trash_mode: TrashMode,
    pub(crate) show_trash: bool,
    pub(crate) show_boxes: bool,
    pub(crate) drawing_mode: bool,
    pub(crate) drawing: DrawingLayer,
    pub(crate) brush_color: String,
    pub(crate) brush_size: f32,
    pub(crate) filter: Filter,
    pub(crate) layout: LayoutCache,
    pub(crate) edit: Option<EditSession>,
    pub(crate) haiku: Option<String>,
    frame: Vec<DrawCommand>,
    measurer: Box<dyn TextMeasurer>,
}

impl BoothState {
    pub fn new(config: BoothConfig, canvas: CanvasSize) -> Self {
        Self {
            canvas,
            detections: Vec::new(),
            overlays: OverlayStore::default(),
            accessories: AccessorySelection::default(),
            style: config.text_style.clone(),
            selection: None,
            gesture: Gesture::Idle,
            trash_mode: config.trash_mode,
            show_trash: config.trash_mode == TrashMode::Always,
            show_boxes: config.show_boxes,
            drawing_mode: false,
            drawing: DrawingLayer::default(),
            brush_color: config.brush_color.clone(),
            brush_size: config.brush_size,
            filter: Filter::None,
            layout: LayoutCache::default(),
            edit: None,
            haiku: None,
            frame: Vec::new(),
            measurer: Box::new(ApproxTextMeasurer::default()),
            config,
        }
    }

    /// Swap in a real font measurer.
    pub fn with_measurer(mut self, measurer: Box<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    pub fn accessories(&self) -> &AccessorySelection {
        &self.accessories
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    pub fn selection(&self) -> Option<ElementKey> {
        self.selection
    }

    pub fn trash_mode(&self) -> TrashMode {
        self.trash_mode
    }

    pub fn is_trash_visible(&self) -> bool {
        self.show_trash
    }

    pub fn is_drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    pub fn drawing(&self) -> &DrawingLayer {
        &self.drawing
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn layout(&self) -> &LayoutCache {
        &self.layout
    }

    pub fn edit(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn haiku(&self) -> Option<&str> {
        self.haiku.as_deref()
    }

    /// Commands produced by the most recent redraw.
    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.frame
    }

    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    /// Replace the detection set wholesale. Takes effect on the next redraw.
    pub fn set_detections(&mut self, detections: Vec<Detection>) {
        self.detections = detections;
    }

    /// Resolved face ids of the current detections, in detector order.
    pub fn present_faces(&self) -> Vec<FaceId> {
        self.detections.iter().enumerate().map(|(i, d)| d.resolved_face_id(i)).collect()
    }

    /// Bring accessory slots in line with the current detections and selection.
    pub fn reconcile(&mut self) {
        let present = self.present_faces();
        self.overlays.reconcile(&present, &self.accessories, self.config.evict_after_frames);

        if let Some(key) = self.selection {
            if !self.overlays.contains(key) {
                self.selection = None;
                self.gesture = Gesture::Idle;
            }
        }
    }

    /// Reconcile, render, and keep the resulting layout for hit-testing.
    pub fn redraw(&mut self) -> &[DrawCommand] {
        self.reconcile();
        let output = render(self, self.measurer.as_ref());
        self.layout = output.layout;
        self.frame = output.commands;
        &self.frame
    }

    /// Select an element (or nothing). Selecting text copies its style into
    /// the style panel.
    pub fn select(&mut self, key: Option<ElementKey>) {
        self.selection = key;
        if let Some((_, style)) = key.and_then(|k| self.overlays.text(k)) {
            self.style = style.clone();
        }
    }

    /// Choose the emoji for an accessory kind across every face; `None` turns it off.
    pub fn select_accessory(&mut self, kind: AccessoryKind, emoji: Option<String>) {
        tracing::debug!(kind = kind.name(), emoji = ?emoji, "accessory selection changed");
        self.accessories.set(kind, emoji);
    }

    pub fn set_show_boxes(&mut self, show: bool) {
        self.show_boxes = show;
    }

    /// Flip drawing mode. Entering it abandons any overlay gesture.
    pub fn toggle_drawing_mode(&mut self) -> bool {
        self.drawing_mode = !self.drawing_mode;
        if self.drawing_mode {
            self.gesture = Gesture::Idle;
        } else {
            self.drawing.end();
        }
        tracing::info!(enabled = self.drawing_mode, "drawing mode toggled");
        self.drawing_mode
    }

    pub fn set_brush(&mut self, color: &str, size: f32) {
        self.brush_color = color.to_string();
        if size.is_finite() && size > 0.0 {
            self.brush_size = size;
        }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        tracing::info!(filter = %filter, "filter selected");
        self.filter = filter;
    }

    /// `auto -> always -> never -> auto`. Only `always` shows the trash right away.
    pub fn cycle_trash_mode(&mut self) -> TrashMode {
        self.trash_mode = self.trash_mode.next();
        self.show_trash = self.trash_mode == TrashMode::Always;
        tracing::info!(mode = ?self.trash_mode, "trash mode changed");
        self.redraw();
        self.trash_mode
    }

    /// Add text from an interpreted command.
    pub fn add_text(&mut self, parsed: ParsedText) -> Result<ElementKey, BoothError> {
        let style = parsed.style();
        let key = match parsed.placement {
            TextPlacement::FaceRelative => {
                self.insert_face_text(parsed.target_face.unwrap_or(0), &parsed.content, parsed.offset, style)?
            }
            TextPlacement::Absolute => self.insert_absolute_text(&parsed.content, DEFAULT_TEXT_POSITION, style)?,
        };
        tracing::info!(element = ?key, position = %parsed.position_description, "text added");
        self.redraw();
        Ok(key)
    }

    /// Add face-relative text in the current style to the `index`th detected face.
    pub fn add_face_text_at(&mut self, index: usize, content: &str, offset: Point) -> Result<ElementKey, BoothError> {
        let key = self.insert_face_text(index, content, offset, self.style.clone())?;
        self.redraw();
        Ok(key)
    }

    /// Add absolute text in the current style at `position`.
    pub fn add_absolute_text_at(&mut self, content: &str, position: Point) -> ElementKey {
        let key = self.overlays.add_absolute_text(content.to_string(), position, self.style.clone());
        self.redraw();
        key
    }

    fn insert_face_text(
        &mut self,
        index: usize,
        content: &str,
        offset: Point,
        style: TextStyle,
    ) -> Result<ElementKey, BoothError> {
        if content.trim().is_empty() {
            return Err(BoothError::EmptyTextContent);
        }
        if self.detections.is_empty() {
            return Err(BoothError::NoFacesDetected);
        }
        let detection = self.detections.get(index).ok_or(BoothError::FaceNotFound {
            requested: index,
            detected: self.detections.len(),
        })?;
        let face = detection.resolved_face_id(index);
        Ok(self.overlays.add_face_text(face, content.to_string(), offset, style))
    }

    fn insert_absolute_text(&mut self, content: &str, position: Point, style: TextStyle) -> Result<ElementKey, BoothError> {
        if content.trim().is_empty() {
            return Err(BoothError::EmptyTextContent);
        }
        Ok(self.overlays.add_absolute_text(content.to_string(), position, style))
    }

    /// Remember the latest generated haiku so it can be placed later.
    pub fn set_haiku(&mut self, haiku: Option<String>) {
        self.haiku = haiku.filter(|h| !h.trim().is_empty());
    }

    /// Place the current haiku as absolute text near the bottom-right.
    pub fn add_haiku(&mut self) -> Result<ElementKey, BoothError> {
        let haiku = self.haiku.clone().ok_or(BoothError::NoHaiku)?;
        let position = Point::new(self.canvas.width * HAIKU_POSITION.0, self.canvas.height * HAIKU_POSITION.1);
        let style = TextStyle {
            font_size: HAIKU_MIN_SIZE.max(self.style.font_size - HAIKU_SIZE_REDUCTION),
            ..self.style.clone()
        };
        let key = self.insert_absolute_text(&haiku, position, style)?;
        tracing::info!(element = ?key, "haiku added");
        self.redraw();
        Ok(key)
    }

    /// Remove an element from its owning collection. Deleting an accessory
    /// also turns its kind off globally so the next reconcile does not bring it back.
    pub(crate) fn remove_element(&mut self, key: ElementKey) -> Result<(), BoothError> {
        if !self.overlays.remove(key) {
            return Err(BoothError::ElementNotFound(key));
        }
        if let ElementKey::Accessory { accessory, .. } = key {
            self.accessories.set(accessory, None);
        }
        if self.selection == Some(key) {
            self.selection = None;
        }
        if self.edit.as_ref().is_some_and(|e| e.key == key) {
            self.edit = None;
        }
        tracing::info!(element = ?key, "element deleted");
        Ok(())
    }

    pub fn delete_element(&mut self, key: ElementKey) -> Result<(), BoothError> {
        self.remove_element(key)?;
        self.redraw();
        Ok(())
    }

    pub fn clear_accessories(&mut self) {
        self.accessories = AccessorySelection::default();
        self.overlays.clear_accessories();
        self.selection = None;
        self.gesture = Gesture::Idle;
        tracing::info!("accessories cleared");
        self.redraw();
    }

    /// Drop all text, the pending haiku and any edit; the trash goes back to `auto`.
    pub fn clear_text(&mut self) {
        self.overlays.clear_text();
        self.haiku = None;
        self.edit = None;
        self.selection = None;
        self.gesture = Gesture::Idle;
        self.trash_mode = TrashMode::Auto;
        self.show_trash = false;
        tracing::info!("text cleared");
        self.redraw();
    }

    pub fn clear_drawing(&mut self) {
        self.drawing.clear();
        tracing::info!("drawing cleared");
    }

    pub fn clear_all(&mut self) {
        self.clear_accessories();
        self.clear_text();
        self.clear_drawing();
        self.filter = Filter::None;
        tracing::info!("everything cleared");
    }

    /// Apply `update` to the style panel and to the selected text, if any.
    fn update_style(&mut self, update: impl Fn(&mut TextStyle)) {
        update(&mut self.style);
        if let Some((_, style)) = self.selection.and_then(|k| self.overlays.text_mut(k)) {
            update(style);
        }
        self.redraw();
    }

    pub fn set_text_color(&mut self, color: &str) {
        self.update_style(|s| s.color = color.to_string());
    }

    /// Non-positive or non-finite sizes are ignored.
    pub fn set_text_size(&mut self, size: f32) {
        if !(size.is_finite() && size > 0.0) {
            tracing::warn!(size, "ignoring invalid text size");
            return;
        }
        self.update_style(|s| s.font_size = size);
    }

    pub fn set_text_font(&mut self, family: &str) {
        self.update_style(|s| s.font_family = family.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_command::parse_locally;
    use crate::types::{BoundingBox, Keypoint};

    fn make_detection(face_id: Option<FaceId>) -> Detection {
        Detection {
            face_id,
            bounding_box: Some(BoundingBox::new(100.0, 50.0, 200.0, 200.0)),
            keypoints: vec![Keypoint::new(0.3, 0.4), Keypoint::new(0.4, 0.4), Keypoint::new(0.35, 0.5)],
            confidence: None,
        }
    }

    fn booth() -> BoothState {
        BoothState::new(BoothConfig::default(), CanvasSize::new(640.0, 480.0))
    }

    #[test]
    fn test_face_text_requires_faces() {
        let mut state = booth();
        let parsed = parse_locally("put 'yo' on my face", &TextStyle::default());
        assert_eq!(state.add_text(parsed.clone()), Err(BoothError::NoFacesDetected));

        state.set_detections(vec![make_detection(None)]);
        let mut second = parsed.clone();
        second.target_face = Some(1);
        assert_eq!(
            state.add_text(second),
            Err(BoothError::FaceNotFound { requested: 1, detected: 1 })
        );
        assert!(matches!(state.add_text(parsed), Ok(ElementKey::FaceText { face: 0, .. })));
    }

    #[test]
    fn test_face_text_keyed_by_detector_id() {
        let mut state = booth();
        state.set_detections(vec![make_detection(Some(42))]);
        let key = state.add_face_text_at(0, "hey", Point::new(0.0, -60.0)).unwrap();
        assert_eq!(key.container(), crate::overlay::Container::Face(42));
    }

    #[test]
    fn test_absolute_text_defaults() {
        let mut state = booth();
        let key = state.add_text(parse_locally("HI", state.style())).unwrap();
        let text = state.overlays().absolute_texts()[0].clone();
        assert_eq!(key, ElementKey::AbsoluteText { id: text.id });
        assert_eq!((text.x, text.y, text.scale, text.rotation), (50.0, 50.0, 1.0, 0.0));
    }

    #[test]
    fn test_haiku_placement_and_size() {
        let mut state = booth();
        assert_eq!(state.add_haiku(), Err(BoothError::NoHaiku));

        state.set_haiku(Some("old pond\nfrog jumps in\nsplash".into()));
        state.add_haiku().unwrap();
        let text = &state.overlays().absolute_texts()[0];
        assert_eq!((text.x, text.y), (480.0, 384.0));
        assert_eq!(text.style.font_size, 16.0);
    }

    #[test]
    fn test_delete_accessory_clears_global_selection() {
        let mut state = booth();
        state.set_detections(vec![make_detection(None)]);
        state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
        state.redraw();

        let key = ElementKey::Accessory { face: 0, accessory: AccessoryKind::Hat };
        state.delete_element(key).unwrap();
        assert!(state.accessories().hat.is_none());
        // Reconcile recreates the slot but without an emoji.
        assert!(state.overlays().accessory(0, AccessoryKind::Hat).unwrap().emoji.is_none());
        assert_eq!(state.delete_element(ElementKey::AbsoluteText { id: 99 }), Err(BoothError::ElementNotFound(ElementKey::AbsoluteText { id: 99 })));
    }

    #[test]
    fn test_style_changes_follow_selected_text() {
        let mut state = booth();
        let key = state.add_absolute_text_at("HI", Point::new(50.0, 50.0));
        state.select(Some(key));
        state.set_text_color("#00ff00");
        state.set_text_size(40.0);
        state.set_text_size(-1.0);

        let (_, style) = state.overlays().text(key).unwrap();
        assert_eq!(style.color, "#00ff00");
        assert_eq!(style.font_size, 40.0);
        assert_eq!(state.style().font_size, 40.0);
    }

    #[test]
    fn test_selecting_text_syncs_style_panel() {
        let mut state = booth();
        state.set_text_color("#123456");
        let key = state.add_absolute_text_at("A", Point::default());
        state.set_text_color("#ffffff");
        state.select(Some(key));
        assert_eq!(state.style().color, "#123456");
    }

    #[test]
    fn test_clear_text_resets_trash() {
        let mut state = booth();
        state.cycle_trash_mode();
        assert!(state.is_trash_visible());
        state.add_absolute_text_at("A", Point::default());
        state.set_haiku(Some("h".into()));

        state.clear_text();
        assert_eq!(state.overlays().text_count(), 0);
        assert_eq!(state.trash_mode(), TrashMode::Auto);
        assert!(!state.is_trash_visible());
        assert!(state.haiku().is_none());
    }

    #[test]
    fn test_clear_all_resets_filter_and_drawing() {
        let mut state = booth();
        state.set_filter(Filter::Vintage);
        state.toggle_drawing_mode();
        state.drawing_start(Point::new(1.0, 1.0));
        state.drawing_end();
        state.select_accessory(AccessoryKind::Glasses, Some("👓".into()));

        state.clear_all();
        assert_eq!(state.filter(), Filter::None);
        assert!(!state.drawing().has_drawing());
        assert_eq!(state.accessories(), &AccessorySelection::default());
    }

    #[test]
    fn test_eviction_clears_stale_selection() {
        let config = BoothConfig { evict_after_frames: Some(0), ..Default::default() };
        let mut state = BoothState::new(config, CanvasSize::new(640.0, 480.0));
        state.set_detections(vec![make_detection(None)]);
        state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
        state.redraw();
        state.select(Some(ElementKey::Accessory { face: 0, accessory: AccessoryKind::Hat }));

        state.set_detections(Vec::new());
        state.redraw();
        assert_eq!(state.overlays().face_count(), 0);
        assert!(state.selection().is_none());
    }
}
