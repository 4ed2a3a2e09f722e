//! Track registry for person detections
//!
//! This module associates per-frame detections with persistent track IDs using
//! a blend of box overlap and center distance, and retires tracks that have not
//! been seen for longer than a timeout.
//!
//! # Features
//! - Hybrid matching: `0.5 * IoU + 0.5 * distance score`
//! - Monotonic track IDs that are never reused
//! - Deterministic tie-breaking (creation order)
//! - Time-based expiry with final dwell reporting
//!
//! # Example
//! ```no_run
//! use guardian_common::{BoundingBox, WhitelistVerdict};
//! use guardian_motion_tracking::{TrackRegistry, TrackingConfig};
//!
//! let mut registry = TrackRegistry::new(TrackingConfig::default());
//! let bbox = BoundingBox::new(10.0, 10.0, 60.0, 160.0);
//!
//! let id = registry.match_or_create(&bbox);
//! if !registry.contains(id) {
//!     registry.create(id, bbox, 0.0, WhitelistVerdict::stranger());
//! }
//! // ... once per frame, after all detections
//! let expired = registry.expire(6.0, 5.0);
//! ```

mod track;

pub use track::Track;

use guardian_common::{BoundingBox, Timestamp, TrackId, WhitelistVerdict};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

/// Track registry errors
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Upper bound on the keypoint sets a track keeps
pub const MAX_KEYPOINT_HISTORY: usize = 10;

/// Track registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Minimum combined score a match must exceed (default: 0.25)
    pub match_threshold: f32,
    /// Weight of IoU in the combined score; distance gets the rest (default: 0.5)
    pub iou_weight: f32,
    /// Center distance at which the distance score reaches 0 (default: 100)
    pub max_distance: f32,
    /// Seconds without a matching detection before a track is dropped (default: 5.0)
    pub timeout_secs: f64,
    /// Number of keypoint sets kept per track, at most [`MAX_KEYPOINT_HISTORY`] (default: 10)
    pub keypoint_history: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.25,
            iou_weight: 0.5,
            max_distance: guardian_common::DEFAULT_MAX_DISTANCE,
            timeout_secs: 5.0,
            keypoint_history: MAX_KEYPOINT_HISTORY,
        }
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), TrackingError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(TrackingError::InvalidConfig(format!(
                "match_threshold must be in [0, 1], got {}",
                self.match_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.iou_weight) {
            return Err(TrackingError::InvalidConfig(format!(
                "iou_weight must be in [0, 1], got {}",
                self.iou_weight
            )));
        }
        if self.max_distance <= 0.0 {
            return Err(TrackingError::InvalidConfig(format!(
                "max_distance must be positive, got {}",
                self.max_distance
            )));
        }
        if !(self.timeout_secs >= 0.0) {
            return Err(TrackingError::InvalidConfig(format!(
                "timeout_secs must be non-negative, got {}",
                self.timeout_secs
            )));
        }
        if !(1..=MAX_KEYPOINT_HISTORY).contains(&self.keypoint_history) {
            return Err(TrackingError::InvalidConfig(format!(
                "keypoint_history must be in [1, {}], got {}",
                MAX_KEYPOINT_HISTORY, self.keypoint_history
            )));
        }
        Ok(())
    }
}

/// A track removed by [`TrackRegistry::expire`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpiredTrack {
    pub id: TrackId,
    /// Seconds between creation and the last matching detection
    pub dwell_secs: f64,
}

/// Owns the live tracks of one stream
#[derive(Debug)]
pub struct TrackRegistry {
    config: TrackingConfig,
    tracks: BTreeMap<TrackId, Track>,
    /// Ids handed out by `match_or_create` that are not live yet
    pending: BTreeSet<TrackId>,
    next_id: TrackId,
}

impl TrackRegistry {
    /// Create new track registry
    pub fn new(config: TrackingConfig) -> Self {
        info!("Creating track registry with config: {:?}", config);
        Self {
            config,
            tracks: BTreeMap::new(),
            pending: BTreeSet::new(),
            next_id: 1,
        }
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Combined association score between a detection and a track box
    pub fn combined_score(&self, detection: &BoundingBox, track: &BoundingBox) -> f32 {
        let iou = detection.iou(track);
        let distance = detection.distance_score(track, self.config.max_distance);
        self.config.iou_weight * iou + (1.0 - self.config.iou_weight) * distance
    }

    /// Return the best-matching live track, or allocate a fresh id.
    ///
    /// A fresh id is not live until [`create`](Self::create) is called with it.
    pub fn match_or_create(&mut self, bbox: &BoundingBox) -> TrackId {
        let mut best: Option<(TrackId, f32)> = None;

        // BTreeMap iterates in id order, i.e. creation order; strict `>` keeps the first on ties
        for (id, track) in &self.tracks {
            let score = self.combined_score(bbox, track.bbox());
            if score <= self.config.match_threshold {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((*id, score));
            }
        }

        match best {
            Some((id, score)) => {
                debug!("Matched detection to track {} (score {:.3})", id, score);
                id
            }
            None => self.allocate_id(),
        }
    }

    fn allocate_id(&mut self) -> TrackId {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id);
        id
    }

    /// Whether `create` would make `id` live: it is pending or was never handed out
    pub fn is_available(&self, id: TrackId) -> bool {
        self.pending.contains(&id) || id >= self.next_id
    }

    /// Make `id` live. An already-live id is refreshed instead.
    ///
    /// Returns `None` for a retired id (expired, cleared, or skipped over):
    /// ids are never reused.
    pub fn create(
        &mut self,
        id: TrackId,
        bbox: BoundingBox,
        now: Timestamp,
        verdict: WhitelistVerdict,
    ) -> Option<&mut Track> {
        if self.tracks.contains_key(&id) {
            return self.update(id, bbox, now);
        }
        if !self.pending.remove(&id) {
            if id < self.next_id {
                debug!("Track id {} is retired, not reusing it", id);
                return None;
            }
            self.next_id = id + 1;
        }

        debug!("Track {} live ({} total)", id, self.tracks.len() + 1);
        let history = self.config.keypoint_history;
        Some(
            self.tracks
                .entry(id)
                .or_insert_with(|| Track::new(id, bbox, now, verdict, history)),
        )
    }

    /// Move a live track's position and liveness forward
    pub fn update(&mut self, id: TrackId, bbox: BoundingBox, now: Timestamp) -> Option<&mut Track> {
        let track = self.tracks.get_mut(&id)?;
        track.refresh(bbox, now);
        Some(track)
    }

    /// Remove every track idle for more than `timeout` seconds
    pub fn expire(&mut self, now: Timestamp, timeout: f64) -> Vec<ExpiredTrack> {
        let expired: Vec<TrackId> = self
            .tracks
            .iter()
            .filter(|(_, t)| t.idle(now) > timeout)
            .map(|(id, _)| *id)
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(track) = self.tracks.remove(&id) {
                let dwell_secs = track.observed_dwell();
                info!("Track {} left - total dwell {:.1}s", id, dwell_secs);
                removed.push(ExpiredTrack { id, dwell_secs });
            }
        }
        removed
    }

    /// Expire using the configured timeout
    pub fn expire_idle(&mut self, now: Timestamp) -> Vec<ExpiredTrack> {
        self.expire(now, self.config.timeout_secs)
    }

    /// Drop all tracks; ids keep increasing afterwards
    pub fn clear(&mut self) -> usize {
        let count = self.tracks.len();
        self.tracks.clear();
        self.pending.clear();
        count
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains_key(&id)
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn get_mut(&mut self, id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Live tracks in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f32, y: f32) -> BoundingBox {
        BoundingBox::from_xywh(x, y, 40.0, 100.0)
    }

    fn observe(registry: &mut TrackRegistry, b: BoundingBox, now: f64) -> TrackId {
        let id = registry.match_or_create(&b);
        if registry.contains(id) {
            registry.update(id, b, now);
        } else {
            registry.create(id, b, now, WhitelistVerdict::stranger());
        }
        id
    }

    #[test]
    fn test_registry_creation() {
        let registry = TrackRegistry::default();
        assert_eq!(registry.next_id, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_registry_allocates_fresh_ids() {
        let mut registry = TrackRegistry::default();
        let a = registry.match_or_create(&bbox(0.0, 0.0));
        let b = registry.match_or_create(&bbox(0.0, 0.0));
        assert_ne!(a, b);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identical_box_matches() {
        let mut registry = TrackRegistry::default();
        let first = observe(&mut registry, bbox(10.0, 10.0), 0.0);
        let second = registry.match_or_create(&bbox(10.0, 10.0));
        assert_eq!(first, second);
        let score = registry.combined_score(&bbox(10.0, 10.0), &bbox(10.0, 10.0));
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fast_motion_still_matches_on_distance() {
        let mut registry = TrackRegistry::default();
        let first = observe(&mut registry, BoundingBox::from_xywh(0.0, 0.0, 20.0, 20.0), 0.0);
        // No overlap, centers 30 apart -> 0.5 * 0.7 = 0.35 > 0.25
        let moved = BoundingBox::from_xywh(30.0, 0.0, 20.0, 20.0);
        assert_eq!(registry.match_or_create(&moved), first);
    }

    #[test]
    fn test_far_box_creates_new_track() {
        let mut registry = TrackRegistry::default();
        let first = observe(&mut registry, bbox(0.0, 0.0), 0.0);
        let far = registry.match_or_create(&bbox(400.0, 0.0));
        assert_ne!(first, far);
    }

    #[test]
    fn test_best_score_wins() {
        let mut registry = TrackRegistry::default();
        let left = observe(&mut registry, bbox(0.0, 0.0), 0.0);
        let right = observe(&mut registry, bbox(60.0, 0.0), 0.0);
        assert_ne!(left, right);
        assert_eq!(registry.match_or_create(&bbox(55.0, 0.0)), right);
        assert_eq!(registry.match_or_create(&bbox(3.0, 0.0)), left);
    }

    #[test]
    fn test_tie_goes_to_oldest_track() {
        let mut registry = TrackRegistry::default();
        let b = bbox(0.0, 0.0);
        registry.create(5, b, 0.0, WhitelistVerdict::stranger());
        registry.create(6, b, 0.0, WhitelistVerdict::stranger());
        assert_eq!(registry.match_or_create(&b), 5);
    }

    #[test]
    fn test_create_advances_allocator() {
        let mut registry = TrackRegistry::default();
        registry.create(9, bbox(0.0, 0.0), 0.0, WhitelistVerdict::stranger());
        assert_eq!(registry.match_or_create(&bbox(500.0, 500.0)), 10);
    }

    #[test]
    fn test_expire_boundary() {
        let mut registry = TrackRegistry::default();
        let stale = observe(&mut registry, bbox(0.0, 0.0), 0.0);
        let fresh = observe(&mut registry, bbox(300.0, 0.0), 0.2);

        let removed = registry.expire(5.1, 5.0);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, stale);
        assert!(registry.contains(fresh));
    }

    #[test]
    fn test_clear_keeps_ids_monotonic() {
        let mut registry = TrackRegistry::default();
        let a = observe(&mut registry, bbox(0.0, 0.0), 0.0);
        observe(&mut registry, bbox(300.0, 0.0), 0.0);
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        let b = observe(&mut registry, bbox(0.0, 0.0), 1.0);
        assert!(b > a + 1);
    }

    #[test]
    fn test_expired_id_not_revived() {
        let mut registry = TrackRegistry::default();
        let id = observe(&mut registry, bbox(0.0, 0.0), 0.0);
        assert_eq!(registry.expire(10.0, 5.0).len(), 1);

        assert!(!registry.is_available(id));
        assert!(registry
            .create(id, bbox(0.0, 0.0), 10.0, WhitelistVerdict::stranger())
            .is_none());
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_pending_id_dropped_by_clear() {
        let mut registry = TrackRegistry::default();
        let id = registry.match_or_create(&bbox(0.0, 0.0));
        assert!(registry.is_available(id));
        registry.clear();
        assert!(registry
            .create(id, bbox(0.0, 0.0), 0.0, WhitelistVerdict::stranger())
            .is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(TrackingConfig::default().validate().is_ok());
        let bad = TrackingConfig {
            match_threshold: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = TrackingConfig {
            keypoint_history: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = TrackingConfig {
            keypoint_history: 50,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
