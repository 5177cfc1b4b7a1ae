use serde::{Deserialize, Serialize};

/// Identity of a detected face. Taken from the detector when it supplies one,
/// otherwise the face's index in the frame's detection list.
pub type FaceId = u32;

/// Sequence number shared by every text element (face-relative and absolute).
pub type TextId = u64;

/// A point in overlay canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Angle in radians of the vector from `self` to `other`.
    pub fn angle_to(&self, other: &Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Point `distance` pixels away along `angle`.
    pub fn offset_polar(&self, angle: f32, distance: f32) -> Point {
        Point::new(self.x + angle.cos() * distance, self.y + angle.sin() * distance)
    }
}

/// Detector keypoint in normalized [0, 1] frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Face bounding box in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub origin_x: f32,
    pub origin_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Self {
        Self { origin_x, origin_y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.origin_x + self.width
    }

    pub fn center_y(&self) -> f32 {
        self.origin_y + self.height / 2.0
    }
}

/// One face found by the detector in the current frame.
///
/// Replaced wholesale every frame; nothing here persists between frames
/// except what the overlay store keys by [`FaceId`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    #[serde(default)]
    pub face_id: Option<FaceId>,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    /// Ordered keypoints; index 0/1 are the eyes, 2 the nose region.
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl Detection {
    /// Face identity, falling back to the detection's position in the frame.
    pub fn resolved_face_id(&self, index: usize) -> FaceId {
        self.face_id.unwrap_or(index as FaceId)
    }

    /// Keypoint at `index`, or `None` when absent or not finite.
    pub fn keypoint(&self, index: usize) -> Option<Keypoint> {
        self.keypoints.get(index).copied().filter(Keypoint::is_finite)
    }

    /// Bounding box, or an empty box at the origin when the detector gave none.
    pub fn bbox_or_default(&self) -> BoundingBox {
        self.bounding_box.unwrap_or_default()
    }
}

/// Pixel dimensions of the overlay canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Pixel length along x expressed as a fraction of the canvas width.
    /// Zero-width canvases map everything to 0.
    pub fn norm_x(&self, px: f32) -> f32 {
        if self.width > 0.0 { px / self.width } else { 0.0 }
    }

    /// Pixel length along y expressed as a fraction of the canvas height.
    pub fn norm_y(&self, px: f32) -> f32 {
        if self.height > 0.0 { px / self.height } else { 0.0 }
    }

    /// Normalized coordinates to pixel space.
    pub fn to_pixels(&self, x: f32, y: f32) -> Point {
        Point::new(x * self.width, y * self.height)
    }

    /// Map a client-space pointer position onto the canvas, given the size the
    /// canvas is displayed at and the display's top-left corner.
    pub fn client_to_canvas(&self, client: Point, display_origin: Point, display: CanvasSize) -> Point {
        let sx = if display.width > 0.0 { self.width / display.width } else { 1.0 };
        let sy = if display.height > 0.0 { self.height / display.height } else { 1.0 };
        Point::new((client.x - display_origin.x) * sx, (client.y - display_origin.y) * sy)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

/// Accessory slot kinds, one slot of each per detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessoryKind {
    Hat,
    Glasses,
    Face,
    Extra,
}

impl AccessoryKind {
    pub const ALL: [AccessoryKind; 4] = [
        AccessoryKind::Hat,
        AccessoryKind::Glasses,
        AccessoryKind::Face,
        AccessoryKind::Extra,
    ];

    /// Paint order within a face: the face emoji sits underneath everything else.
    pub const DRAW_ORDER: [AccessoryKind; 4] = [
        AccessoryKind::Face,
        AccessoryKind::Hat,
        AccessoryKind::Glasses,
        AccessoryKind::Extra,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AccessoryKind::Hat => "hat",
            AccessoryKind::Glasses => "glasses",
            AccessoryKind::Face => "face",
            AccessoryKind::Extra => "extra",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_id_falls_back_to_index() {
        let det = Detection::default();
        assert_eq!(det.resolved_face_id(3), 3);

        let det = Detection { face_id: Some(7), ..Default::default() };
        assert_eq!(det.resolved_face_id(3), 7);
    }

    #[test]
    fn test_non_finite_keypoint_is_absent() {
        let det = Detection {
            keypoints: vec![Keypoint::new(0.5, 0.5), Keypoint::new(f32::NAN, 0.2)],
            ..Default::default()
        };
        assert!(det.keypoint(0).is_some());
        assert!(det.keypoint(1).is_none());
        assert!(det.keypoint(5).is_none());
    }

    #[test]
    fn test_norm_on_zero_canvas() {
        let canvas = CanvasSize::new(0.0, 0.0);
        assert_eq!(canvas.norm_x(100.0), 0.0);
        assert_eq!(canvas.norm_y(100.0), 0.0);
    }

    #[test]
    fn test_client_to_canvas_scales_by_display_ratio() {
        let canvas = CanvasSize::new(640.0, 480.0);
        let display = CanvasSize::new(320.0, 240.0);
        let p = canvas.client_to_canvas(Point::new(110.0, 70.0), Point::new(10.0, 20.0), display);
        assert!((p.x - 200.0).abs() < 1e-4);
        assert!((p.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_detection_deserializes_camel_case() {
        let json = r#"{"boundingBox":{"originX":1,"originY":2,"width":3,"height":4},"keypoints":[{"x":0.1,"y":0.2}]}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.bounding_box, Some(BoundingBox::new(1.0, 2.0, 3.0, 4.0)));
        assert_eq!(det.keypoints.len(), 1);
        assert!(det.face_id.is_none());
    }
}
