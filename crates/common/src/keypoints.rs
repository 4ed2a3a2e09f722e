//! Pose landmarks as delivered by the external pose extractor

use serde::{Deserialize, Serialize};

/// Single body landmark in model-input coordinates plus its visibility in `[0, 1]`.
///
/// Serialized as `[x, y, visibility]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    /// Euclidean distance to another landmark, ignoring visibility
    pub fn distance(&self, other: &Landmark) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f32; 3]> for Landmark {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(l: Landmark) -> Self {
        [l.x, l.y, l.visibility]
    }
}

/// Ordered landmarks for one person in one frame (33 for a full body pose)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeypointSet(Vec<Landmark>);

impl KeypointSet {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.0
    }
}

impl From<Vec<Landmark>> for KeypointSet {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self(landmarks)
    }
}
