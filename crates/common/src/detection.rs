use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// One detected object in one frame, as produced by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: BoundingBox, label: impl Into<String>, score: f32) -> Self {
        Self {
            bbox,
            label: label.into(),
            score,
        }
    }

    #[must_use]
    pub fn is_label(&self, label: &str) -> bool {
        self.label == label
    }
}
