use guardian_common::{KeypointSet, TrackId};
use guardian_hazard::{HazardAlert, HazardKind};
use guardian_pose_estimation::Behavior;
use serde::{Deserialize, Serialize};

/// Alert categories understood by the notification channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Loitering,
    Abnormal,
    Fire,
    Smoke,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Loitering => "loitering",
            AlertKind::Abnormal => "abnormal",
            AlertKind::Fire => "fire",
            AlertKind::Smoke => "smoke",
        }
    }
}

impl From<HazardKind> for AlertKind {
    fn from(kind: HazardKind) -> Self {
        match kind {
            HazardKind::Fire => AlertKind::Fire,
            HazardKind::Smoke => AlertKind::Smoke,
        }
    }
}

/// One alert raised while processing a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Alert {
    Loitering {
        track_id: TrackId,
        elapsed: f64,
        snapshot_id: Option<u64>,
    },
    Abnormal {
        track_id: TrackId,
        behaviors: Vec<Behavior>,
        keypoints: KeypointSet,
        elapsed: f64,
        snapshot_id: Option<u64>,
    },
    Hazard {
        kind: HazardKind,
        confidence: f32,
        elapsed: f64,
        snapshot_id: Option<u64>,
    },
}

impl Alert {
    pub fn hazard(alert: HazardAlert, snapshot_id: Option<u64>) -> Self {
        Alert::Hazard {
            kind: alert.kind,
            confidence: alert.confidence,
            elapsed: alert.elapsed,
            snapshot_id,
        }
    }

    pub fn kind(&self) -> AlertKind {
        match self {
            Alert::Loitering { .. } => AlertKind::Loitering,
            Alert::Abnormal { .. } => AlertKind::Abnormal,
            Alert::Hazard { kind, .. } => (*kind).into(),
        }
    }

    pub fn track_id(&self) -> Option<TrackId> {
        match self {
            Alert::Loitering { track_id, .. } | Alert::Abnormal { track_id, .. } => Some(*track_id),
            Alert::Hazard { .. } => None,
        }
    }

    pub fn elapsed(&self) -> f64 {
        match self {
            Alert::Loitering { elapsed, .. }
            | Alert::Abnormal { elapsed, .. }
            | Alert::Hazard { elapsed, .. } => *elapsed,
        }
    }
}
