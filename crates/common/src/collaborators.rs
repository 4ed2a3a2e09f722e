//! Interfaces of the external collaborators the engine calls into.
//!
//! All calls are synchronous with respect to frame processing. Implementations
//! report failures through [`GuardianError`](crate::GuardianError); the engine
//! logs them and carries on as if the call had returned nothing.

use crate::{BoundingBox, Detection, Frame, KeypointSet, Result, TrackId};

/// Object detector producing the per-frame detection list
pub trait Detector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Pose model run on the region of one person
pub trait PoseExtractor: Send + Sync {
    fn extract_keypoints(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Option<KeypointSet>>;
}

/// Outcome of the face-matching gate for one region
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WhitelistVerdict {
    pub is_member: bool,
    pub name: Option<String>,
}

impl WhitelistVerdict {
    pub fn member(name: impl Into<String>) -> Self {
        Self {
            is_member: true,
            name: Some(name.into()),
        }
    }

    pub fn stranger() -> Self {
        Self::default()
    }
}

/// Face-matching gate deciding whether a person is a known resident
pub trait WhitelistGate: Send + Sync {
    fn check_face(&self, frame: &Frame, bbox: &BoundingBox) -> Result<WhitelistVerdict>;
}

/// Everything the snapshot sink needs to persist one record
#[derive(Debug, Clone)]
pub struct SnapshotRequest<'a> {
    pub frame: &'a Frame,
    /// Region to crop; `None` keeps the whole frame
    pub bbox: Option<BoundingBox>,
    pub score: f32,
    pub track_id: Option<TrackId>,
    pub dwell_secs: f64,
    pub is_alert: bool,
}

/// Snapshot/log persistence; returns the stored record id when there is one
pub trait SnapshotSink: Send + Sync {
    fn persist(&self, request: &SnapshotRequest<'_>) -> Result<Option<u64>>;
}

/// Borrowed bundle of the synchronous collaborators used while processing a frame
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub pose: &'a dyn PoseExtractor,
    pub whitelist: &'a dyn WhitelistGate,
    pub snapshots: &'a dyn SnapshotSink,
}

impl<'a> Collaborators<'a> {
    pub fn new(
        pose: &'a dyn PoseExtractor,
        whitelist: &'a dyn WhitelistGate,
        snapshots: &'a dyn SnapshotSink,
    ) -> Self {
        Self {
            pose,
            whitelist,
            snapshots,
        }
    }
}

/// Pose extractor for deployments without a pose model
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPose;

impl PoseExtractor for NoPose {
    fn extract_keypoints(&self, _frame: &Frame, _bbox: &BoundingBox) -> Result<Option<KeypointSet>> {
        Ok(None)
    }
}

/// Whitelist gate that recognizes nobody
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWhitelist;

impl WhitelistGate for NoWhitelist {
    fn check_face(&self, _frame: &Frame, _bbox: &BoundingBox) -> Result<WhitelistVerdict> {
        Ok(WhitelistVerdict::stranger())
    }
}

/// Snapshot sink that stores nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

impl SnapshotSink for NoSnapshots {
    fn persist(&self, _request: &SnapshotRequest<'_>) -> Result<Option<u64>> {
        Ok(None)
    }
}
