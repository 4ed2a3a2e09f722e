/// Common types and utilities for the guardian surveillance engine
use thiserror::Error;

pub mod clock;
pub mod collaborators;
pub mod detection;
pub mod frame;
pub mod geometry;
pub mod keypoints;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborators::{
    Collaborators, Detector, NoPose, NoSnapshots, NoWhitelist, PoseExtractor, SnapshotRequest,
    SnapshotSink, WhitelistGate, WhitelistVerdict,
};
pub use detection::Detection;
pub use frame::Frame;
pub use geometry::{center, distance_score, iou, BoundingBox, DEFAULT_MAX_DISTANCE};
pub use keypoints::{KeypointSet, Landmark};

/// Identifier of a track. Allocated in increasing order, never reused.
pub type TrackId = u64;

/// Seconds, as produced by a [`Clock`] or carried by a recorded frame.
pub type Timestamp = f64;

/// Errors shared by the engine and its collaborators
#[derive(Debug, Error)]
pub enum GuardianError {
    #[error("Undecodable frame: {0}")]
    UndecodableFrame(String),

    #[error("Detector failed: {0}")]
    Detector(String),

    #[error("Pose extraction failed: {0}")]
    PoseExtraction(String),

    #[error("Whitelist gate failed: {0}")]
    Whitelist(String),

    #[error("Snapshot persistence failed: {0}")]
    Snapshot(String),

    #[error("Alert delivery failed: {0}")]
    AlertDelivery(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<image::ImageError> for GuardianError {
    fn from(err: image::ImageError) -> Self {
        GuardianError::ImageError(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, GuardianError>;
