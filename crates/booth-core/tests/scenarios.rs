use booth_core::anchor::{map_anchor, AnchorKind};
use booth_core::interaction::Release;
use booth_core::overlay::{MAX_SCALE, MIN_SCALE};
use booth_core::text_command::{self, InterpretError, TextInterpreter, TextPlacement, TextSuggestion};
use booth_core::{
    AccessoryKind, BoothConfig, BoothState, BoundingBox, CanvasSize, Detection, DrawCommand, ElementKey, FaceDetector,
    FrameLoop, Keypoint, Point, TrashMode,
};

const CANVAS: CanvasSize = CanvasSize { width: 640.0, height: 480.0 };

fn make_detection(face_id: Option<u32>, bbox: BoundingBox) -> Detection {
    Detection {
        face_id,
        bounding_box: Some(bbox),
        keypoints: vec![
            Keypoint::new(0.3, 0.35),
            Keypoint::new(0.42, 0.37),
            Keypoint::new(0.36, 0.45),
            Keypoint::new(0.36, 0.55),
        ],
        confidence: Some(0.9),
    }
}

fn default_bbox() -> BoundingBox {
    BoundingBox::new(100.0, 50.0, 200.0, 200.0)
}

fn booth() -> BoothState {
    BoothState::new(BoothConfig::default(), CANVAS)
}

fn hat_key() -> ElementKey {
    ElementKey::Accessory { face: 0, accessory: AccessoryKind::Hat }
}

fn glyph_sizes(commands: &[DrawCommand]) -> Vec<(ElementKey, f32)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Glyph { element, font_size, .. } => Some((*element, *font_size)),
            _ => None,
        })
        .collect()
}

#[test]
fn scenario_a_hat_sized_from_bbox() {
    let mut state = booth();
    state.set_detections(vec![make_detection(None, default_bbox())]);
    state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
    let commands = state.redraw().to_vec();

    let slot = state.overlays().accessory(0, AccessoryKind::Hat).unwrap();
    assert_eq!(slot.emoji.as_deref(), Some("🎩"));

    let sizes = glyph_sizes(&commands);
    assert_eq!(sizes.len(), 1);
    assert_eq!(sizes[0].0, hat_key());
    assert!((sizes[0].1 - 180.0).abs() < 1e-3);
}

#[test]
fn scenario_b_drag_absolute_text() {
    let mut state = booth();
    let parsed = text_command::parse_locally("HI", state.style());
    let key = state.add_text(parsed).unwrap();

    let text = state.overlays().absolute_texts()[0].clone();
    assert_eq!((text.x, text.y), (50.0, 50.0));

    state.pointer_down(Point::new(50.0, 50.0)).unwrap();
    state.pointer_move(Point::new(150.0, 120.0));
    state.pointer_up(Point::new(150.0, 120.0));

    let moved = state.overlays().placement(key).unwrap().position;
    assert!((moved.x - 150.0).abs() < 1e-4);
    assert!((moved.y - 120.0).abs() < 1e-4);
}

#[test]
fn scenario_c_drop_accessory_on_trash() {
    let mut state = booth();
    state.set_detections(vec![make_detection(None, default_bbox())]);
    state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
    state.redraw();
    state.cycle_trash_mode();
    assert_eq!(state.trash_mode(), TrashMode::Always);

    let center = state.layout().get(hat_key()).unwrap().center;
    state.pointer_down(center).unwrap();
    let drop = Point::new(CANVAS.width - 50.0, CANVAS.height - 40.0);
    state.pointer_move(drop);
    assert_eq!(state.pointer_up(drop), Release::Deleted(hat_key()));

    assert!(state.accessories().hat.is_none());
    assert!(state.selection().is_none());
    // Reconcile recreates the slot, but empty and with a fresh transform.
    let slot = state.overlays().accessory(0, AccessoryKind::Hat).unwrap();
    assert!(slot.emoji.is_none());
    assert_eq!(slot.transform.offset_x, 0.0);
    assert!(glyph_sizes(state.last_frame()).is_empty());
}

struct FailingInterpreter;

impl TextInterpreter for FailingInterpreter {
    fn interpret(&self, _command: &str) -> Result<TextSuggestion, InterpretError> {
        Err(InterpretError::Unavailable("HTTP 502".into()))
    }
}

#[test]
fn scenario_d_collaborator_failure_falls_back() {
    let mut state = booth();
    state.set_detections(vec![make_detection(None, default_bbox())]);

    let parsed = text_command::interpret(Some(&FailingInterpreter), "write 'boss' above my head", state.style());
    assert_eq!(parsed.content, "boss");
    assert_eq!(parsed.placement, TextPlacement::FaceRelative);
    assert_eq!(parsed.target_face, Some(0));

    let key = state.add_text(parsed).unwrap();
    assert!(matches!(key, ElementKey::FaceText { face: 0, .. }));

    let plain = text_command::interpret(Some(&FailingInterpreter), "hello world", state.style());
    assert_eq!(plain.placement, TextPlacement::Absolute);
    assert!(plain.target_face.is_none());
}

#[test]
fn scenario_e_transform_survives_new_bbox() {
    struct TwoFrames(Vec<Detection>);

    impl FaceDetector for TwoFrames {
        type Frame = ();

        fn detect(&mut self, _frame: &(), _timestamp_ms: f64) -> Result<Vec<Detection>, booth_core::DetectorError> {
            Ok(vec![self.0.remove(0)])
        }
    }

    let mut state = booth();
    state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
    let mut detector = TwoFrames(vec![
        make_detection(Some(7), default_bbox()),
        make_detection(Some(7), BoundingBox::new(140.0, 60.0, 220.0, 230.0)),
    ]);
    let mut frames = FrameLoop::new();

    frames.tick(&mut state, &mut detector, &(), 0.0);
    let key = ElementKey::Accessory { face: 7, accessory: AccessoryKind::Hat };
    let first_center = state.layout().get(key).unwrap().center;

    state.pointer_down(first_center).unwrap();
    state.pointer_move(Point::new(first_center.x + 12.0, first_center.y + 8.0));
    state.pointer_up(Point::new(first_center.x + 12.0, first_center.y + 8.0));
    state.wheel(-1.0);
    let before = state.overlays().accessory(7, AccessoryKind::Hat).unwrap().transform;

    frames.tick(&mut state, &mut detector, &(), 16.0);
    let after = state.overlays().accessory(7, AccessoryKind::Hat).unwrap().transform;
    assert_eq!(before, after);
    assert!((after.scale - 1.6).abs() < 1e-5);

    let second = state.layout().get(key).unwrap();
    assert!((second.font_size - 220.0 * 0.6 * 1.6).abs() < 1e-3);
}

#[test]
fn redraw_is_idempotent() {
    let mut state = booth();
    state.set_detections(vec![make_detection(None, default_bbox())]);
    for kind in AccessoryKind::ALL {
        state.select_accessory(kind, Some("⭐".into()));
    }
    state.add_face_text_at(0, "hey", Point::new(0.0, -60.0)).unwrap();
    state.add_absolute_text_at("HI", Point::new(50.0, 50.0));

    let first = state.redraw().to_vec();
    let first_layout: Vec<_> = state.layout().iter().map(|(k, l)| (k, *l)).collect();
    let second = state.redraw().to_vec();
    let second_layout: Vec<_> = state.layout().iter().map(|(k, l)| (k, *l)).collect();

    assert_eq!(first, second);
    assert_eq!(first_layout, second_layout);
}

#[test]
fn drag_round_trip_restores_offset() {
    let mut state = booth();
    state.set_detections(vec![make_detection(None, default_bbox())]);
    state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
    state.redraw();

    let original = state.overlays().placement(hat_key()).unwrap().position;
    let center = state.layout().get(hat_key()).unwrap().center;
    let (dx, dy) = (37.0, -21.5);

    state.pointer_down(center).unwrap();
    state.pointer_move(Point::new(center.x + dx, center.y + dy));
    state.pointer_up(Point::new(center.x + dx, center.y + dy));

    let moved_center = state.layout().get(hat_key()).unwrap().center;
    state.pointer_down(moved_center).unwrap();
    state.pointer_move(Point::new(moved_center.x - dx, moved_center.y - dy));
    state.pointer_up(Point::new(moved_center.x - dx, moved_center.y - dy));

    let restored = state.overlays().placement(hat_key()).unwrap().position;
    assert!((restored.x - original.x).abs() < 1e-3);
    assert!((restored.y - original.y).abs() < 1e-3);
}

#[test]
fn scale_stays_clamped_for_any_delta() {
    let mut state = booth();
    let key = state.add_absolute_text_at("HI", Point::new(200.0, 200.0));
    state.select(Some(key));

    for delta in [-1e9_f32, -3.0, 0.0, 2.5, 1e9] {
        for _ in 0..50 {
            state.wheel(delta);
            let scale = state.overlays().placement(key).unwrap().scale;
            assert!((MIN_SCALE..=MAX_SCALE).contains(&scale));
        }
    }

    // Resize far outward and right onto the centre.
    state.redraw();
    let handle = state.layout().get(key).unwrap().handle.unwrap().center;
    state.pointer_down(handle).unwrap();
    state.pointer_move(Point::new(5000.0, 200.0));
    assert_eq!(state.overlays().placement(key).unwrap().scale, MAX_SCALE);
    state.pointer_move(Point::new(200.0, 200.0));
    assert_eq!(state.overlays().placement(key).unwrap().scale, MIN_SCALE);
}

#[test]
fn reconcile_keeps_exactly_four_slots_matching_selection() {
    let mut state = booth();
    state.set_detections(vec![
        make_detection(None, default_bbox()),
        make_detection(None, BoundingBox::new(350.0, 60.0, 180.0, 180.0)),
    ]);
    state.select_accessory(AccessoryKind::Glasses, Some("👓".into()));
    state.redraw();

    for face in [0, 1] {
        let overlays = state.overlays().face(face).unwrap();
        let kinds: Vec<_> = overlays.accessories.keys().copied().collect();
        assert_eq!(kinds, AccessoryKind::ALL.to_vec());
        for (kind, slot) in &overlays.accessories {
            assert_eq!(slot.emoji.as_deref(), state.accessories().get(*kind));
        }
    }
}

#[test]
fn short_landmarks_never_panic() {
    let two = [Keypoint::new(0.4, 0.4), Keypoint::new(0.6, 0.42)];
    for kind in AccessoryKind::ALL {
        let anchor = map_anchor(&two, AnchorKind::Accessory(kind), None, CANVAS);
        assert!(anchor.x.is_finite() && anchor.y.is_finite());
    }

    let bbox = default_bbox();
    let extra = map_anchor(&two, AnchorKind::Accessory(AccessoryKind::Extra), Some(&bbox), CANVAS);
    assert!((extra.x - (300.0 + 0.12 * 640.0) / 640.0).abs() < 1e-5);
    assert!((extra.y - 150.0 / 480.0).abs() < 1e-5);

    let mut state = booth();
    state.set_detections(vec![Detection { keypoints: two.to_vec(), ..Default::default() }]);
    for kind in AccessoryKind::ALL {
        state.select_accessory(kind, Some("⭐".into()));
    }
    state.set_show_boxes(true);
    state.redraw();
}

#[test]
fn stale_faces_retained_unless_eviction_configured() {
    let mut state = booth();
    state.select_accessory(AccessoryKind::Hat, Some("🎩".into()));
    for id in 0..5 {
        state.set_detections(vec![make_detection(Some(id), default_bbox())]);
        state.redraw();
    }
    assert_eq!(state.overlays().face_count(), 5);

    let config = BoothConfig { evict_after_frames: Some(1), ..Default::default() };
    let mut state = BoothState::new(config, CANVAS);
    for id in 0..5 {
        state.set_detections(vec![make_detection(Some(id), default_bbox())]);
        state.redraw();
    }
    assert_eq!(state.overlays().face_count(), 2);
}
