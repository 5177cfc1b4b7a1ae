//! Overlay state store: per-face accessory slots, face-relative text and
//! absolute text, each with its own persistent transform.

use crate::types::{AccessoryKind, FaceId, Point, TextId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_SCALE: f32 = 0.3;
pub const MAX_SCALE: f32 = 4.0;
pub const DEFAULT_ACCESSORY_SCALE: f32 = 1.5;

/// Clamp a scale factor into `[MIN_SCALE, MAX_SCALE]`. NaN collapses to the minimum.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        return MIN_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// User-controlled offset, scale and rotation of a face-anchored element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
    /// Radians, added to any rotation the layout derives from landmarks.
    pub rotation: f32,
}

impl Transform {
    pub fn with_offset(offset_x: f32, offset_y: f32) -> Self {
        Self { offset_x, offset_y, scale: 1.0, rotation: 0.0 }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self { offset_x: 0.0, offset_y: 0.0, scale: DEFAULT_ACCESSORY_SCALE, rotation: 0.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub color: String,
    pub font_size: f32,
    pub font_family: String,
}

impl TextStyle {
    /// Outline colour drawn under the fill so text stays legible over video.
    pub fn stroke_color(&self) -> &'static str {
        if self.color.eq_ignore_ascii_case("#ffffff") { "#000000" } else { "#ffffff" }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self { color: "#ffffff".to_string(), font_size: 24.0, font_family: "Arial".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AccessorySlot {
    /// Refreshed from the global accessory selection on every reconcile pass.
    pub emoji: Option<String>,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceText {
    pub content: String,
    pub transform: Transform,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsoluteText {
    pub id: TextId,
    pub content: String,
    pub x: f32,
    pub y: f32,
    #[serde(flatten)]
    pub style: TextStyle,
    pub scale: f32,
    pub rotation: f32,
}

/// Everything anchored to one face.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FaceOverlays {
    pub accessories: BTreeMap<AccessoryKind, AccessorySlot>,
    pub texts: BTreeMap<TextId, FaceText>,
    /// Consecutive reconcile passes this face was not detected.
    #[serde(skip)]
    pub absent_passes: u32,
}

/// Which collection owns an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Container {
    Face(FaceId),
    Absolute,
}

/// Identity of an overlay element across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementKey {
    Accessory { face: FaceId, accessory: AccessoryKind },
    FaceText { face: FaceId, id: TextId },
    AbsoluteText { id: TextId },
}

impl ElementKey {
    pub fn container(&self) -> Container {
        match self {
            ElementKey::Accessory { face, .. } | ElementKey::FaceText { face, .. } => Container::Face(*face),
            ElementKey::AbsoluteText { .. } => Container::Absolute,
        }
    }

    pub fn is_text(&self) -> bool {
        !matches!(self, ElementKey::Accessory { .. })
    }
}

/// Position, scale and rotation of any element in one shape.
///
/// `position` is the pixel offset from the face anchor for face-anchored
/// elements and the absolute canvas position for absolute text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub scale: f32,
    pub rotation: f32,
}

/// Currently chosen emoji per accessory kind; `None` means the kind is off.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccessorySelection {
    pub hat: Option<String>,
    pub glasses: Option<String>,
    pub face: Option<String>,
    pub extra: Option<String>,
}

impl AccessorySelection {
    pub fn get(&self, kind: AccessoryKind) -> Option<&str> {
        match kind {
            AccessoryKind::Hat => self.hat.as_deref(),
            AccessoryKind::Glasses => self.glasses.as_deref(),
            AccessoryKind::Face => self.face.as_deref(),
            AccessoryKind::Extra => self.extra.as_deref(),
        }
    }

    pub fn set(&mut self, kind: AccessoryKind, emoji: Option<String>) {
        let slot = match kind {
            AccessoryKind::Hat => &mut self.hat,
            AccessoryKind::Glasses => &mut self.glasses,
            AccessoryKind::Face => &mut self.face,
            AccessoryKind::Extra => &mut self.extra,
        };
        *slot = emoji;
    }
}

/// Persistent overlay state. Transforms survive across frames for as long as
/// the owning face id keeps recurring (and beyond, unless eviction is enabled).
#[derive(Debug, Clone, Serialize)]
pub struct OverlayStore {
    faces: BTreeMap<FaceId, FaceOverlays>,
    absolute: Vec<AbsoluteText>,
    #[serde(skip)]
    next_text_id: TextId,
}

impl Default for OverlayStore {
    fn default() -> Self {
        Self { faces: BTreeMap::new(), absolute: Vec::new(), next_text_id: 1 }
    }
}

impl OverlayStore {
    /// Make sure every present face has all four accessory slots and refresh
    /// their emoji from `selection`. Faces not present are left alone, or
    /// evicted once absent for more than `evict_after` passes.
    pub fn reconcile(&mut self, present: &[FaceId], selection: &AccessorySelection, evict_after: Option<u32>) {
        for &face in present {
            let overlays = self.faces.entry(face).or_insert_with(|| {
                tracing::debug!(face, "creating accessory slots for new face");
                FaceOverlays::default()
            });
            overlays.absent_passes = 0;
            for kind in AccessoryKind::ALL {
                let slot = overlays.accessories.entry(kind).or_default();
                slot.emoji = selection.get(kind).map(str::to_string);
            }
        }

        for (face, overlays) in self.faces.iter_mut() {
            if !present.contains(face) {
                overlays.absent_passes = overlays.absent_passes.saturating_add(1);
            }
        }

        if let Some(limit) = evict_after {
            self.faces.retain(|face, overlays| {
                let keep = overlays.absent_passes <= limit;
                if !keep {
                    tracing::debug!(face, absent = overlays.absent_passes, "evicting stale face overlays");
                }
                keep
            });
        }
    }

    pub fn face(&self, face: FaceId) -> Option<&FaceOverlays> {
        self.faces.get(&face)
    }

    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &FaceOverlays)> {
        self.faces.iter().map(|(id, f)| (*id, f))
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn absolute_texts(&self) -> &[AbsoluteText] {
        &self.absolute
    }

    pub fn absolute_text(&self, id: TextId) -> Option<&AbsoluteText> {
        self.absolute.iter().find(|t| t.id == id)
    }

    pub fn face_text(&self, face: FaceId, id: TextId) -> Option<&FaceText> {
        self.faces.get(&face)?.texts.get(&id)
    }

    pub fn accessory(&self, face: FaceId, kind: AccessoryKind) -> Option<&AccessorySlot> {
        self.faces.get(&face)?.accessories.get(&kind)
    }

    fn take_text_id(&mut self) -> TextId {
        let id = self.next_text_id;
        self.next_text_id += 1;
        id
    }

    pub fn add_face_text(&mut self, face: FaceId, content: String, offset: Point, style: TextStyle) -> ElementKey {
        let id = self.take_text_id();
        let text = FaceText { content, transform: Transform::with_offset(offset.x, offset.y), style };
        self.faces.entry(face).or_default().texts.insert(id, text);
        ElementKey::FaceText { face, id }
    }

    pub fn add_absolute_text(&mut self, content: String, position: Point, style: TextStyle) -> ElementKey {
        let id = self.take_text_id();
        self.absolute.push(AbsoluteText {
            id,
            content,
            x: position.x,
            y: position.y,
            style,
            scale: 1.0,
            rotation: 0.0,
        });
        ElementKey::AbsoluteText { id }
    }

    pub fn contains(&self, key: ElementKey) -> bool {
        match key {
            ElementKey::Accessory { face, accessory } => self.accessory(face, accessory).is_some(),
            ElementKey::FaceText { face, id } => self.face_text(face, id).is_some(),
            ElementKey::AbsoluteText { id } => self.absolute_text(id).is_some(),
        }
    }

    /// Remove an element from its owning collection. Returns false when absent.
    pub fn remove(&mut self, key: ElementKey) -> bool {
        match key {
            ElementKey::Accessory { face, accessory } => self
                .faces
                .get_mut(&face)
                .is_some_and(|f| f.accessories.remove(&accessory).is_some()),
            ElementKey::FaceText { face, id } => {
                self.faces.get_mut(&face).is_some_and(|f| f.texts.remove(&id).is_some())
            }
            ElementKey::AbsoluteText { id } => {
                let before = self.absolute.len();
                self.absolute.retain(|t| t.id != id);
                self.absolute.len() != before
            }
        }
    }

    pub fn placement(&self, key: ElementKey) -> Option<Placement> {
        let from_transform = |t: &Transform| Placement {
            position: Point::new(t.offset_x, t.offset_y),
            scale: t.scale,
            rotation: t.rotation,
        };
        match key {
            ElementKey::Accessory { face, accessory } => {
                self.accessory(face, accessory).map(|s| from_transform(&s.transform))
            }
            ElementKey::FaceText { face, id } => self.face_text(face, id).map(|t| from_transform(&t.transform)),
            ElementKey::AbsoluteText { id } => self.absolute_text(id).map(|t| Placement {
                position: Point::new(t.x, t.y),
                scale: t.scale,
                rotation: t.rotation,
            }),
        }
    }

    /// Overwrite an element's placement, clamping its scale. Returns false when absent.
    pub fn set_placement(&mut self, key: ElementKey, placement: Placement) -> bool {
        let scale = clamp_scale(placement.scale);
        let apply = |t: &mut Transform| {
            t.offset_x = placement.position.x;
            t.offset_y = placement.position.y;
            t.scale = scale;
            t.rotation = placement.rotation;
        };
        match key {
            ElementKey::Accessory { face, accessory } => {
                match self.faces.get_mut(&face).and_then(|f| f.accessories.get_mut(&accessory)) {
                    Some(slot) => {
                        apply(&mut slot.transform);
                        true
                    }
                    None => false,
                }
            }
            ElementKey::FaceText { face, id } => match self.faces.get_mut(&face).and_then(|f| f.texts.get_mut(&id)) {
                Some(text) => {
                    apply(&mut text.transform);
                    true
                }
                None => false,
            },
            ElementKey::AbsoluteText { id } => match self.absolute.iter_mut().find(|t| t.id == id) {
                Some(text) => {
                    text.x = placement.position.x;
                    text.y = placement.position.y;
                    text.scale = scale;
                    text.rotation = placement.rotation;
                    true
                }
                None => false,
            },
        }
    }

    /// Content and style of a text element; `None` for accessories.
    pub fn text(&self, key: ElementKey) -> Option<(&str, &TextStyle)> {
        match key {
            ElementKey::Accessory { .. } => None,
            ElementKey::FaceText { face, id } => self.face_text(face, id).map(|t| (t.content.as_str(), &t.style)),
            ElementKey::AbsoluteText { id } => self.absolute_text(id).map(|t| (t.content.as_str(), &t.style)),
        }
    }

    pub fn text_mut(&mut self, key: ElementKey) -> Option<(&mut String, &mut TextStyle)> {
        match key {
            ElementKey::Accessory { .. } => None,
            ElementKey::FaceText { face, id } => self
                .faces
                .get_mut(&face)
                .and_then(|f| f.texts.get_mut(&id))
                .map(|t| (&mut t.content, &mut t.style)),
            ElementKey::AbsoluteText { id } => self
                .absolute
                .iter_mut()
                .find(|t| t.id == id)
                .map(|t| (&mut t.content, &mut t.style)),
        }
    }

    /// Absolute plus face-relative text elements.
    pub fn text_count(&self) -> usize {
        self.absolute.len() + self.faces.values().map(|f| f.texts.len()).sum::<usize>()
    }

    pub fn clear_text(&mut self) {
        self.absolute.clear();
        for overlays in self.faces.values_mut() {
            overlays.texts.clear();
        }
    }

    pub fn clear_accessories(&mut self) {
        for overlays in self.faces.values_mut() {
            overlays.accessories.clear();
        }
        self.faces.retain(|_, f| !f.texts.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hat_only(emoji: &str) -> AccessorySelection {
        AccessorySelection { hat: Some(emoji.to_string()), ..Default::default() }
    }

    #[test]
    fn test_clamp_scale_bounds() {
        assert_eq!(clamp_scale(0.0), MIN_SCALE);
        assert_eq!(clamp_scale(-5.0), MIN_SCALE);
        assert_eq!(clamp_scale(100.0), MAX_SCALE);
        assert_eq!(clamp_scale(f32::NAN), MIN_SCALE);
        assert_eq!(clamp_scale(f32::INFINITY), MAX_SCALE);
        assert!((clamp_scale(1.2) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_reconcile_creates_four_slots() {
        let mut store = OverlayStore::default();
        store.reconcile(&[0, 5], &hat_only("🎩"), None);
        for face in [0, 5] {
            let overlays = store.face(face).unwrap();
            assert_eq!(overlays.accessories.len(), 4);
            assert_eq!(overlays.accessories[&AccessoryKind::Hat].emoji.as_deref(), Some("🎩"));
            assert!(overlays.accessories[&AccessoryKind::Glasses].emoji.is_none());
            assert_eq!(overlays.accessories[&AccessoryKind::Hat].transform.scale, DEFAULT_ACCESSORY_SCALE);
        }
    }

    #[test]
    fn test_reconcile_deselect_clears_emoji_but_keeps_transform() {
        let mut store = OverlayStore::default();
        store.reconcile(&[0], &hat_only("🎩"), None);
        let key = ElementKey::Accessory { face: 0, accessory: AccessoryKind::Hat };
        store.set_placement(key, Placement { position: Point::new(10.0, -4.0), scale: 2.0, rotation: 0.3 });

        store.reconcile(&[0], &AccessorySelection::default(), None);
        let slot = store.accessory(0, AccessoryKind::Hat).unwrap();
        assert!(slot.emoji.is_none());
        assert_eq!(slot.transform.offset_x, 10.0);
        assert_eq!(slot.transform.scale, 2.0);
    }

    #[test]
    fn test_stale_faces_retained_by_default() {
        let mut store = OverlayStore::default();
        for face in 0..10 {
            store.reconcile(&[face], &hat_only("🎩"), None);
        }
        assert_eq!(store.face_count(), 10);
    }

    #[test]
    fn test_stale_faces_evicted_when_enabled() {
        let mut store = OverlayStore::default();
        store.reconcile(&[0, 1], &hat_only("🎩"), Some(2));
        store.reconcile(&[0], &hat_only("🎩"), Some(2));
        store.reconcile(&[0], &hat_only("🎩"), Some(2));
        assert!(store.face(1).is_some());
        store.reconcile(&[0], &hat_only("🎩"), Some(2));
        assert!(store.face(1).is_none());
        assert!(store.face(0).is_some());
    }

    #[test]
    fn test_set_placement_clamps_scale() {
        let mut store = OverlayStore::default();
        let key = store.add_absolute_text("HI".into(), Point::new(50.0, 50.0), TextStyle::default());
        assert!(store.set_placement(key, Placement { position: Point::new(1.0, 2.0), scale: 9.0, rotation: 0.0 }));
        let p = store.placement(key).unwrap();
        assert_eq!(p.scale, MAX_SCALE);
        assert_eq!(p.position, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_text_ids_are_shared_sequence() {
        let mut store = OverlayStore::default();
        let a = store.add_absolute_text("a".into(), Point::default(), TextStyle::default());
        let b = store.add_face_text(0, "b".into(), Point::default(), TextStyle::default());
        assert_eq!(a, ElementKey::AbsoluteText { id: 1 });
        assert_eq!(b, ElementKey::FaceText { face: 0, id: 2 });
        assert_eq!(store.text_count(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut store = OverlayStore::default();
        store.reconcile(&[0], &hat_only("🎩"), None);
        let text = store.add_face_text(0, "yo".into(), Point::default(), TextStyle::default());
        let abs = store.add_absolute_text("hi".into(), Point::default(), TextStyle::default());

        assert!(store.remove(abs));
        assert!(!store.remove(abs));
        assert!(store.remove(ElementKey::Accessory { face: 0, accessory: AccessoryKind::Hat }));
        assert!(store.accessory(0, AccessoryKind::Hat).is_none());

        store.clear_accessories();
        assert!(store.contains(text));
        store.clear_text();
        assert_eq!(store.text_count(), 0);
    }

    #[test]
    fn test_stroke_color_contrasts_with_white() {
        let mut style = TextStyle::default();
        assert_eq!(style.stroke_color(), "#000000");
        style.color = "#ff0000".into();
        assert_eq!(style.stroke_color(), "#ffffff");
    }
}
