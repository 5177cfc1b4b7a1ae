//! Landmark mapper: detector keypoints to normalized placement anchors.
//!
//! Every rule tolerates short or malformed keypoint lists and falls through
//! to a weaker anchor instead of failing.

use crate::types::{AccessoryKind, BoundingBox, CanvasSize, Keypoint};
use serde::Serialize;

/// How far above the eye line the hat sits, as a fraction of face height.
const HAT_LIFT: f32 = 0.7;
/// Horizontal shift applied to keypoint 6 for the `extra` accessory.
const EXTRA_KEYPOINT_SHIFT: f32 = 0.15;
/// Gap between the bounding box's right edge and the `extra` accessory, as a fraction of canvas width.
const EXTRA_BBOX_GAP: f32 = 0.12;

/// What an anchor is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    Accessory(AccessoryKind),
    /// Face-relative text docks at the top of the head.
    Text,
}

/// Normalized anchor. `x2`/`y2` differ from `x`/`y` only for two-point anchors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Anchor {
    fn point(x: f32, y: f32) -> Self {
        Self { x, y, x2: x, y2: y }
    }

    /// True when the anchor carries two distinct points (both coordinates differ).
    pub fn is_span(&self) -> bool {
        self.x != self.x2 && self.y != self.y2
    }
}

/// Map a detection's keypoints and bounding box to the anchor for `kind`.
pub fn map_anchor(
    keypoints: &[Keypoint],
    kind: AnchorKind,
    bbox: Option<&BoundingBox>,
    canvas: CanvasSize,
) -> Anchor {
    let kp = |i: usize| keypoints.get(i).copied().filter(Keypoint::is_finite);

    let matched = match kind {
        AnchorKind::Accessory(AccessoryKind::Hat) | AnchorKind::Text => hat_anchor(&kp, bbox, canvas),
        AnchorKind::Accessory(AccessoryKind::Glasses) => match (kp(0), kp(1)) {
            (Some(a), Some(b)) => Some(Anchor { x: a.x, y: a.y, x2: b.x, y2: b.y }),
            _ => None,
        },
        AnchorKind::Accessory(AccessoryKind::Face) => kp(2).map(|p| Anchor::point(p.x, p.y)),
        AnchorKind::Accessory(AccessoryKind::Extra) => match (kp(6), bbox) {
            (Some(p), _) => Some(Anchor::point(p.x + EXTRA_KEYPOINT_SHIFT, p.y)),
            (None, Some(b)) => Some(Anchor::point(
                canvas.norm_x(b.right() + EXTRA_BBOX_GAP * canvas.width),
                canvas.norm_y(b.center_y()),
            )),
            (None, None) => None,
        },
    };

    if let Some(anchor) = matched {
        return anchor;
    }

    match (kp(0), kp(1)) {
        (Some(a), Some(b)) => Anchor::point((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
        _ => Anchor::default(),
    }
}

fn hat_anchor(
    kp: &impl Fn(usize) -> Option<Keypoint>,
    bbox: Option<&BoundingBox>,
    canvas: CanvasSize,
) -> Option<Anchor> {
    let (a, b, bbox) = (kp(0)?, kp(1)?, bbox?);
    let mid_x = (a.x + b.x) / 2.0;
    let mid_y = (a.y + b.y) / 2.0;
    Some(Anchor::point(mid_x, mid_y - canvas.norm_y(bbox.height) * HAT_LIFT))
}
