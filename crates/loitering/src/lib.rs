//! Loitering and abnormal-behavior decisions for tracked people
//!
//! Drives one matched person detection per call through the per-track state
//! machine: whitelist gate on arrival, dwell judgment, pose-based behavior
//! escalation, and the at-most-once notification latches.
//!
//! # Example
//! ```no_run
//! use guardian_common::{BoundingBox, Collaborators, Frame, NoPose, NoSnapshots, NoWhitelist};
//! use guardian_loitering::{LoiteringConfig, LoiteringMonitor, Observation};
//! use guardian_motion_tracking::TrackRegistry;
//!
//! let mut registry = TrackRegistry::default();
//! let mut monitor = LoiteringMonitor::new(LoiteringConfig::default());
//! let collaborators = Collaborators::new(&NoPose, &NoWhitelist, &NoSnapshots);
//!
//! let frame = Frame::without_image(0, 0.0);
//! let bbox = BoundingBox::new(10.0, 10.0, 60.0, 160.0);
//! let track_id = registry.match_or_create(&bbox);
//! let outcome = monitor.observe(
//!     &mut registry,
//!     Observation::new(track_id, bbox, 0.9, &frame),
//!     collaborators,
//! );
//! assert!(!outcome.is_loitering());
//! ```

mod outcome;

pub use outcome::LoiterOutcome;

use guardian_common::{
    BoundingBox, Collaborators, Frame, KeypointSet, SnapshotRequest, Timestamp, TrackId,
    WhitelistVerdict,
};
use guardian_motion_tracking::{Track, TrackRegistry};
use guardian_pose_estimation::{
    BehaviorAnalyzer, BehaviorConfig, PoseSampler, PoseSamplingConfig, PoseSettings,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Loitering state machine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoiteringConfig {
    /// Dwell after which a non-whitelisted person counts as loitering (default: 5.0)
    pub dwell_threshold_secs: f64,
    /// Pose extraction sampling
    pub pose: PoseSamplingConfig,
    /// Behavior rule thresholds
    pub behavior: BehaviorConfig,
}

impl Default for LoiteringConfig {
    fn default() -> Self {
        Self {
            dwell_threshold_secs: 5.0,
            pose: PoseSamplingConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

/// One matched person detection
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub track_id: TrackId,
    pub bbox: BoundingBox,
    pub score: f32,
    pub frame: &'a Frame,
    /// Defaults to the frame timestamp
    pub now: Timestamp,
}

impl<'a> Observation<'a> {
    pub fn new(track_id: TrackId, bbox: BoundingBox, score: f32, frame: &'a Frame) -> Self {
        Self {
            track_id,
            bbox,
            score,
            frame,
            now: frame.timestamp,
        }
    }

    pub fn at(mut self, now: Timestamp) -> Self {
        self.now = now;
        self
    }
}

/// Per-stream loitering state machine
#[derive(Debug)]
pub struct LoiteringMonitor {
    dwell_threshold: f64,
    analyzer: BehaviorAnalyzer,
    sampler: PoseSampler,
}

impl LoiteringMonitor {
    pub fn new(config: LoiteringConfig) -> Self {
        Self {
            dwell_threshold: config.dwell_threshold_secs,
            sampler: PoseSampler::new(&config.pose),
            analyzer: BehaviorAnalyzer::new(config.behavior),
        }
    }

    pub fn dwell_threshold(&self) -> f64 {
        self.dwell_threshold
    }

    pub fn pose_settings(&self) -> PoseSettings {
        self.sampler.settings()
    }

    pub fn sampler_mut(&mut self) -> &mut PoseSampler {
        &mut self.sampler
    }

    /// Evaluate one detection already associated with `observation.track_id`.
    ///
    /// Unknown ids are made live here, after the whitelist gate has run once.
    /// Known ids are refreshed, then judged on dwell and pose.
    pub fn observe(
        &mut self,
        registry: &mut TrackRegistry,
        observation: Observation<'_>,
        collaborators: Collaborators<'_>,
    ) -> LoiterOutcome {
        let Observation {
            track_id,
            bbox,
            now,
            frame,
            ..
        } = observation;

        if !registry.contains(track_id) {
            if !registry.is_available(track_id) {
                debug!("Ignoring observation of retired track {}", track_id);
                return LoiterOutcome::None;
            }
            let verdict = match collaborators.whitelist.check_face(frame, &bbox) {
                Ok(verdict) => verdict,
                Err(e) => {
                    warn!("Whitelist check failed for track {}: {}", track_id, e);
                    WhitelistVerdict::stranger()
                }
            };
            let Some(track) = registry.create(track_id, bbox, now, verdict) else {
                return LoiterOutcome::None;
            };
            match track.whitelist_name() {
                Some(name) => info!("Whitelisted person detected: {} (track {})", name, track_id),
                None if track.is_whitelisted() => {
                    info!("Whitelisted person detected (track {})", track_id)
                }
                None => info!("New person detected (track {})", track_id),
            }
            return LoiterOutcome::None;
        }

        let Some(track) = registry.update(track_id, bbox, now) else {
            return LoiterOutcome::None;
        };
        if track.is_whitelisted() {
            return LoiterOutcome::None;
        }

        let elapsed = track.dwell(now);
        if elapsed < self.dwell_threshold {
            return LoiterOutcome::None;
        }

        let (keypoints, fresh) = self.current_keypoints(track, &observation, collaborators);
        let behaviors = match &keypoints {
            // History holds only earlier sets at this point
            Some(kp) => self.analyzer.analyze(kp, track.keypoint_history()),
            None => Vec::new(),
        };
        if let (true, Some(kp)) = (fresh, &keypoints) {
            track.record_keypoints(kp.clone());
        }

        if !behaviors.is_empty() && !track.abnormal_notified() {
            let names: Vec<&str> = behaviors.iter().map(|b| b.as_str()).collect();
            warn!(
                "Abnormal behavior detected: track {} - {}",
                track_id,
                names.join(", ")
            );
            let snapshot_id = persist_alert(&observation, elapsed, collaborators);
            track.latch_abnormal_notified();
            return LoiterOutcome::Abnormal {
                behaviors,
                keypoints: keypoints.unwrap_or_default(),
                elapsed,
                snapshot_id,
            };
        }

        if !track.loiter_notified() {
            warn!("Loitering detected: track {} - {:.1}s", track_id, elapsed);
            let snapshot_id = persist_alert(&observation, elapsed, collaborators);
            track.latch_loiter_notified();
            return LoiterOutcome::Loitering {
                elapsed,
                keypoints,
                snapshot_id,
            };
        }

        LoiterOutcome::Tracking { keypoints }
    }

    /// Keypoints for this query and whether they were freshly extracted.
    ///
    /// Skipped queries reuse the track's cached set; a failed or empty
    /// extraction yields nothing.
    fn current_keypoints(
        &mut self,
        track: &Track,
        observation: &Observation<'_>,
        collaborators: Collaborators<'_>,
    ) -> (Option<KeypointSet>, bool) {
        if !self.sampler.is_enabled() {
            return (None, false);
        }
        if !self.sampler.should_sample() {
            return (track.last_keypoints().cloned(), false);
        }

        match collaborators
            .pose
            .extract_keypoints(observation.frame, &observation.bbox)
        {
            Ok(Some(kp)) => {
                debug!("Track {}: {} landmarks extracted", track.id(), kp.len());
                (Some(kp), true)
            }
            Ok(None) => (None, false),
            Err(e) => {
                warn!("Pose extraction failed for track {}: {}", track.id(), e);
                (None, false)
            }
        }
    }
}

impl Default for LoiteringMonitor {
    fn default() -> Self {
        Self::new(LoiteringConfig::default())
    }
}

fn persist_alert(
    observation: &Observation<'_>,
    dwell_secs: f64,
    collaborators: Collaborators<'_>,
) -> Option<u64> {
    let request = SnapshotRequest {
        frame: observation.frame,
        bbox: Some(observation.bbox),
        score: observation.score,
        track_id: Some(observation.track_id),
        dwell_secs,
        is_alert: true,
    };
    match collaborators.snapshots.persist(&request) {
        Ok(id) => id,
        Err(e) => {
            warn!(
                "Snapshot failed for track {}: {}",
                observation.track_id, e
            );
            None
        }
    }
}
