use guardian_common::KeypointSet;
use guardian_pose_estimation::Behavior;
use serde::Serialize;

/// Result of evaluating one person detection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoiterOutcome {
    /// Nothing to report: new, whitelisted, or below the dwell threshold
    None,
    /// First crossing of the dwell threshold
    Loitering {
        elapsed: f64,
        keypoints: Option<KeypointSet>,
        snapshot_id: Option<u64>,
    },
    /// First abnormal behavior seen on a loitering track
    Abnormal {
        behaviors: Vec<Behavior>,
        keypoints: KeypointSet,
        elapsed: f64,
        snapshot_id: Option<u64>,
    },
    /// Already reported; carries the latest pose only
    Tracking { keypoints: Option<KeypointSet> },
}

impl LoiterOutcome {
    /// Whether the person is flagged as a loiterer in the frame output
    pub fn is_loitering(&self) -> bool {
        !matches!(self, LoiterOutcome::None)
    }

    /// Whether this outcome raises an alert
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            LoiterOutcome::Loitering { .. } | LoiterOutcome::Abnormal { .. }
        )
    }

    pub fn keypoints(&self) -> Option<&KeypointSet> {
        match self {
            LoiterOutcome::None => None,
            LoiterOutcome::Loitering { keypoints, .. } | LoiterOutcome::Tracking { keypoints } => {
                keypoints.as_ref()
            }
            LoiterOutcome::Abnormal { keypoints, .. } => Some(keypoints),
        }
    }
}
