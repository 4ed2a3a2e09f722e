//! Axis-aligned box geometry used for detection-to-track association

use serde::{Deserialize, Serialize};

/// Distance (in model-input units) at which the distance score saturates to 0
pub const DEFAULT_MAX_DISTANCE: f32 = 100.0;

/// Bounding box in `(x1, y1, x2, y2)` corner form.
///
/// Serialized as a four-element array, the same shape the detector emits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from top-left corner plus size
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    #[inline]
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    #[inline]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            (intersection / union).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Euclidean distance between the two box centers
    pub fn center_distance(&self, other: &BoundingBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// `max(0, 1 - distance / max_distance)`; 0 for a non-positive `max_distance`
    pub fn distance_score(&self, other: &BoundingBox, max_distance: f32) -> f32 {
        if max_distance <= 0.0 {
            return 0.0;
        }
        let score = 1.0 - self.center_distance(other) / max_distance;
        if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        }
    }

    /// Scale every coordinate, e.g. from model-input space to frame pixels
    pub fn scale(&self, sx: f32, sy: f32) -> BoundingBox {
        BoundingBox::new(self.x1 * sx, self.y1 * sy, self.x2 * sx, self.y2 * sy)
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Midpoint of the box
pub fn center(b: &BoundingBox) -> (f32, f32) {
    b.center()
}

/// Intersection over union, 0 when the boxes do not overlap or the union is empty
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.iou(b)
}

/// Center-distance similarity with the default 100-unit saturation distance
pub fn distance_score(a: &BoundingBox, b: &BoundingBox) -> f32 {
    a.distance_score(b, DEFAULT_MAX_DISTANCE)
}
