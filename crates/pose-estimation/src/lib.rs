//! Pose-driven behavior analysis for loitering candidates
//!
//! The pose model itself is an external collaborator
//! ([`PoseExtractor`](guardian_common::PoseExtractor)); this crate works on the
//! 33-landmark keypoint sets it returns.
//!
//! # Features
//! - Named full-body landmarks ([`PoseLandmark`])
//! - Rule-based behavior tags: fall, hands up, fast motion ([`BehaviorAnalyzer`])
//! - Stream-wide sampling so the pose model is not run on every frame ([`PoseSampler`])
//!
//! # Example
//! ```
//! use guardian_common::{KeypointSet, Landmark};
//! use guardian_pose_estimation::{Behavior, BehaviorAnalyzer, PoseLandmark};
//!
//! let mut landmarks = vec![Landmark::new(0.0, 110.0, 0.9); 33];
//! landmarks[PoseLandmark::Nose.index()] = Landmark::new(0.0, 100.0, 0.9);
//! let lying = KeypointSet::new(landmarks);
//!
//! let history: Vec<KeypointSet> = Vec::new();
//! let analyzer = BehaviorAnalyzer::default();
//! assert_eq!(analyzer.analyze(&lying, &history), vec![Behavior::Fall]);
//! ```

pub mod behavior;
pub mod landmarks;
pub mod sampler;

pub use behavior::{Behavior, BehaviorAnalyzer, BehaviorConfig};
pub use landmarks::{PoseLandmark, POSE_LANDMARK_COUNT};
pub use sampler::{PoseSampler, PoseSamplingConfig, PoseSettings, MAX_FRAME_INTERVAL, MIN_FRAME_INTERVAL};
