//! Guardian - surveillance alert engine
//!
//! Tracks people across frames, raises a single alert when a stranger stays
//! too long, flags abnormal postures of loiterers, and reports fire or smoke
//! that persists. Each concern lives in its own crate; this crate re-exports
//! them under one roof.
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`common`] | Geometry, detections, frames, collaborator traits |
//! | [`tracking`] | Track registry and IoU association |
//! | [`pose`] | Landmark layout, behavior rules, pose sampling |
//! | [`loitering`] | Per-track dwell and alert state machine |
//! | [`hazard`] | Fire/smoke persistence windows |
//! | [`orchestrator`] | Per-frame engine, config, dispatch, sessions |

pub use guardian_common as common;
pub use guardian_hazard as hazard;
pub use guardian_loitering as loitering;
pub use guardian_motion_tracking as tracking;
pub use guardian_orchestrator as orchestrator;
pub use guardian_pose_estimation as pose;

pub use guardian_common::{
    BoundingBox, Collaborators, Detection, Detector, Frame, GuardianError, KeypointSet,
    PoseExtractor, Result, SnapshotSink, WhitelistGate, WhitelistVerdict,
};
pub use guardian_orchestrator::{
    Alert, AlertKind, AlertSink, EncodedFrame, FrameOrchestrator, FrameResult, GuardianConfig,
    StreamSession,
};
