use booth_capture::{CapturePipeline, UploadError, UploadMetadata, UploadReceipt, UploadSink, UploadStatus};
use booth_core::{AccessoryKind, BoothConfig, BoothState, BoundingBox, CanvasSize, Detection, Filter, Point};
use image::{Rgba, RgbaImage};

#[derive(Default)]
struct RecordingSink {
    uploads: Vec<(Vec<u8>, UploadMetadata)>,
}

impl UploadSink for RecordingSink {
    fn upload(&mut self, png: &[u8], metadata: &UploadMetadata) -> Result<UploadReceipt, UploadError> {
        self.uploads.push((png.to_vec(), metadata.clone()));
        Ok(UploadReceipt { photo_id: "p-1".into(), filename: Some("Dapper Otter".into()) })
    }
}

#[test]
fn capture_bakes_filter_and_uploads_composite() {
    let canvas = CanvasSize { width: 64.0, height: 48.0 };
    let mut state = BoothState::new(BoothConfig::default(), canvas);
    state.set_detections(vec![Detection {
        bounding_box: Some(BoundingBox::new(10.0, 10.0, 30.0, 30.0)),
        ..Default::default()
    }]);
    state.select_accessory(AccessoryKind::Glasses, Some("👓".into()));
    state.add_absolute_text_at("HI", Point::new(20.0, 20.0));
    state.set_filter(Filter::Grayscale);
    state.toggle_drawing_mode();
    state.set_brush("#ff0000", 4.0);
    state.drawing_start(Point::new(5.0, 40.0));
    state.drawing_move(Point::new(30.0, 40.0));
    state.drawing_end();

    let video = RgbaImage::from_pixel(64, 48, Rgba([20, 80, 200, 255]));
    let mut overlay = RgbaImage::new(64, 48);
    overlay.put_pixel(50, 5, Rgba([0, 0, 255, 255]));

    let mut sink = RecordingSink::default();
    let mut pipeline = CapturePipeline::from_state(&state);
    let outcome = pipeline.capture(&state, &video, Some(&overlay), Some(&mut sink)).unwrap();

    // Video is filtered, overlay and drawing are not.
    let [r, g, b, _] = outcome.image.get_pixel(60, 30).0;
    assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1);
    assert_eq!(outcome.image.get_pixel(50, 5).0, [0, 0, 255, 255]);
    assert_eq!(outcome.image.get_pixel(15, 40).0, [255, 0, 0, 255]);

    assert!(matches!(outcome.upload, UploadStatus::Uploaded(ref r) if r.photo_id == "p-1"));
    assert_eq!(sink.uploads.len(), 1);
    let (png, meta) = &sink.uploads[0];
    assert_eq!(png, &outcome.png);
    assert_eq!(meta.accessories.glasses.as_deref(), Some("👓"));
    assert_eq!(meta.filter, Filter::Grayscale);
    assert!(meta.has_drawing);
    assert_eq!(meta.text_count, 1);
}

#[test]
fn auto_upload_disabled_skips_sink() {
    let config = BoothConfig { auto_upload: false, ..Default::default() };
    let state = BoothState::new(config, CanvasSize { width: 8.0, height: 8.0 });
    let video = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
    let mut sink = RecordingSink::default();
    let mut pipeline = CapturePipeline::from_state(&state);

    let outcome = pipeline.capture(&state, &video, None, Some(&mut sink)).unwrap();
    assert_eq!(outcome.upload, UploadStatus::Skipped);
    assert!(sink.uploads.is_empty());

    // Manual upload still works.
    assert!(matches!(pipeline.upload_last(&mut sink), UploadStatus::Uploaded(_)));
}

#[test]
fn named_brush_color_still_captures() {
    let mut state = BoothState::new(BoothConfig::default(), CanvasSize { width: 32.0, height: 16.0 });
    state.toggle_drawing_mode();
    state.set_brush("red", 4.0);
    state.drawing_start(Point::new(4.0, 8.0));
    state.drawing_move(Point::new(20.0, 8.0));
    state.drawing_end();

    let video = RgbaImage::from_pixel(32, 16, Rgba([255, 255, 255, 255]));
    let mut pipeline = CapturePipeline::new(false);
    let outcome = pipeline.capture(&state, &video, None, None).unwrap();

    assert_eq!(outcome.image.get_pixel(12, 8).0, booth_capture::FALLBACK_BRUSH.0);
    assert_eq!(outcome.image.get_pixel(28, 2).0, [255, 255, 255, 255]);
    assert!(outcome.metadata.has_drawing);
}
