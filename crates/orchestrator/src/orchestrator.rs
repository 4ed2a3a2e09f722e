use guardian_common::{
    BoundingBox, Collaborators, Detection, Frame, KeypointSet, SnapshotRequest, Timestamp,
    TrackId,
};
use guardian_hazard::{HazardKind, HazardMonitor, HazardSightings};
use guardian_loitering::{LoiterOutcome, LoiteringMonitor, Observation};
use guardian_motion_tracking::TrackRegistry;
use guardian_pose_estimation::PoseSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::alert::Alert;
use crate::config::{FrameConfig, GuardianConfig};

/// A detection as reported back to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDetection {
    #[serde(flatten)]
    pub detection: Detection,
    /// Set for tracked persons only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_loitering: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<KeypointSet>,
}

impl AnnotatedDetection {
    fn plain(detection: Detection) -> Self {
        Self {
            detection,
            track_id: None,
            is_loitering: None,
            keypoints: None,
        }
    }
}

/// Immediate, unfiltered notice of a fire or smoke detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardSighting {
    pub label: HazardKind,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub score: f32,
}

/// Everything produced for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_index: u64,
    pub timestamp: Timestamp,
    pub detections: Vec<AnnotatedDetection>,
    pub active_tracks: usize,
    pub alerts: Vec<Alert>,
    pub hazard_sightings: Vec<HazardSighting>,
}

/// Per-stream engine state: track registry, loitering and hazard monitors
#[derive(Debug)]
pub struct FrameOrchestrator {
    frame: FrameConfig,
    registry: TrackRegistry,
    loitering: LoiteringMonitor,
    hazards: HazardMonitor,
}

impl FrameOrchestrator {
    pub fn new(config: GuardianConfig) -> Self {
        let GuardianConfig {
            tracking,
            loitering,
            hazard,
            frame,
            ..
        } = config;
        Self {
            frame,
            registry: TrackRegistry::new(tracking),
            loitering: LoiteringMonitor::new(loitering),
            hazards: HazardMonitor::new(hazard),
        }
    }

    /// Run one frame's detections through tracking, loitering and hazard checks.
    ///
    /// Idle tracks are expired once, after every detection has been handled.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        detections: Vec<Detection>,
        collaborators: Collaborators<'_>,
    ) -> FrameResult {
        let now = frame.timestamp;
        let hazard_floor = self.hazards.config().confidence_floor;

        let mut annotated = Vec::with_capacity(detections.len());
        let mut alerts = Vec::new();
        let mut sightings = HazardSightings::new();
        let mut hazard_sightings = Vec::new();

        for detection in detections {
            if detection.is_label(&self.frame.person_label) {
                if detection.score < self.frame.person_score_floor {
                    annotated.push(AnnotatedDetection::plain(detection));
                    continue;
                }
                let track_id = self.registry.match_or_create(&detection.bbox);
                let observation =
                    Observation::new(track_id, detection.bbox, detection.score, frame).at(now);
                let outcome = self
                    .loitering
                    .observe(&mut self.registry, observation, collaborators);

                let is_loitering = outcome.is_loitering();
                let keypoints = outcome.keypoints().cloned();
                if let Some(alert) = person_alert(track_id, outcome) {
                    alerts.push(alert);
                }
                annotated.push(AnnotatedDetection {
                    detection,
                    track_id: Some(track_id),
                    is_loitering: Some(is_loitering),
                    keypoints,
                });
            } else if let Some(kind) = HazardKind::from_label(&detection.label) {
                debug!("Hazard sighting: {} (score {:.2})", kind, detection.score);
                sightings.record(kind, detection.score, hazard_floor);
                hazard_sightings.push(HazardSighting {
                    label: kind,
                    bbox: detection.bbox,
                    score: detection.score,
                });
                annotated.push(AnnotatedDetection::plain(detection));
            } else {
                annotated.push(AnnotatedDetection::plain(detection));
            }
        }

        self.registry.expire_idle(now);

        for hazard in self.hazards.evaluate(&sightings, now) {
            let request = SnapshotRequest {
                frame,
                bbox: None,
                score: hazard.confidence,
                track_id: None,
                dwell_secs: hazard.elapsed,
                is_alert: true,
            };
            let snapshot_id = match collaborators.snapshots.persist(&request) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Snapshot failed for {} alert: {}", hazard.kind, e);
                    None
                }
            };
            alerts.push(Alert::hazard(hazard, snapshot_id));
        }

        FrameResult {
            frame_index: frame.index,
            timestamp: now,
            detections: annotated,
            active_tracks: self.registry.len(),
            alerts,
            hazard_sightings,
        }
    }

    /// Discard all per-stream state. Returns the number of tracks dropped.
    pub fn end_session(&mut self) -> usize {
        let cleared = self.registry.clear();
        self.hazards.reset();
        self.loitering.sampler_mut().reset();
        info!("Session ended: cleared {} tracks", cleared);
        cleared
    }

    pub fn active_tracks(&self) -> usize {
        self.registry.len()
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    pub fn hazards(&self) -> &HazardMonitor {
        &self.hazards
    }

    pub fn pose_settings(&self) -> PoseSettings {
        self.loitering.pose_settings()
    }

    pub fn set_pose_enabled(&mut self, enabled: bool) {
        self.loitering.sampler_mut().set_enabled(enabled);
    }

    /// Returns the interval applied after clamping
    pub fn set_pose_interval(&mut self, interval: u32) -> u32 {
        self.loitering.sampler_mut().set_interval(interval)
    }
}

fn person_alert(track_id: TrackId, outcome: LoiterOutcome) -> Option<Alert> {
    match outcome {
        LoiterOutcome::Loitering {
            elapsed,
            snapshot_id,
            ..
        } => Some(Alert::Loitering {
            track_id,
            elapsed,
            snapshot_id,
        }),
        LoiterOutcome::Abnormal {
            behaviors,
            keypoints,
            elapsed,
            snapshot_id,
        } => Some(Alert::Abnormal {
            track_id,
            behaviors,
            keypoints,
            elapsed,
            snapshot_id,
        }),
        LoiterOutcome::None | LoiterOutcome::Tracking { .. } => None,
    }
}
