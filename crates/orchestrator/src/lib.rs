//! Frame-level surveillance engine
//!
//! Ties the track registry, the loitering state machine and the hazard
//! monitor together behind a per-frame API, and adds the stream plumbing
//! around it: configuration, alert dispatch, snapshot storage and sessions.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use guardian_common::{Detection, Detector, Frame, Result};
//! use guardian_orchestrator::{
//!     EncodedFrame, GuardianConfig, StreamSession, TracingAlertSink,
//! };
//! use tokio::sync::mpsc;
//!
//! struct MyDetector;
//!
//! impl Detector for MyDetector {
//!     fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # async fn run(jpeg: Vec<u8>) {
//! let session = StreamSession::new(
//!     GuardianConfig::default(),
//!     Arc::new(MyDetector),
//!     Arc::new(TracingAlertSink),
//! );
//! let (frame_tx, frame_rx) = mpsc::channel(8);
//! let (result_tx, mut result_rx) = mpsc::channel(8);
//! let worker = tokio::spawn(session.run(frame_rx, result_tx));
//!
//! frame_tx.send(EncodedFrame::new(jpeg)).await.unwrap();
//! drop(frame_tx);
//! while let Some(result) = result_rx.recv().await {
//!     println!("{} active tracks", result.active_tracks);
//! }
//! let summary = worker.await.unwrap();
//! # }
//! ```

pub mod alert;
pub mod config;
pub mod dispatch;
pub mod orchestrator;
pub mod session;
pub mod snapshot;

pub use alert::{Alert, AlertKind};
pub use config::{ConfigError, DispatchConfig, FrameConfig, GuardianConfig, SessionConfig};
pub use dispatch::{AlertDispatcher, AlertSink, DispatchStats, TracingAlertSink};
pub use orchestrator::{AnnotatedDetection, FrameOrchestrator, FrameResult, HazardSighting};
pub use session::{EncodedFrame, SessionSummary, StreamSession};
pub use snapshot::{crop_region, JpegSnapshotSink, SnapshotRecord, DETECTION_LOG};
