//! One client stream: decode, detect, evaluate, dispatch
//!
//! A session processes its frames strictly in arrival order on a single task.
//! Per-stream state lives in the session's [`FrameOrchestrator`] and is
//! discarded when the input channel closes.
//!
//! Detector and collaborator calls are synchronous. On a multi-threaded
//! runtime they run inside [`tokio::task::block_in_place`], so a slow model
//! does not stall other tasks; on a current-thread runtime they run inline
//! and must be cheap.

use std::sync::Arc;
use std::time::Instant;

use guardian_common::{
    Clock, Collaborators, Detector, Frame, NoPose, NoSnapshots, NoWhitelist, PoseExtractor,
    SnapshotSink, SystemClock, Timestamp, WhitelistGate,
};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::GuardianConfig;
use crate::dispatch::{AlertDispatcher, AlertSink, DispatchStats};
use crate::orchestrator::{FrameOrchestrator, FrameResult};

/// Encoded (JPEG/PNG) frame as received from the transport
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub data: Vec<u8>,
    /// Capture time; the session clock is used when absent
    pub timestamp: Option<Timestamp>,
}

impl EncodedFrame {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: None,
        }
    }

    pub fn at(data: Vec<u8>, timestamp: Timestamp) -> Self {
        Self {
            data,
            timestamp: Some(timestamp),
        }
    }
}

/// Counters reported when a session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub tracks_cleared: usize,
    pub alerts_delivered: usize,
    pub alerts_dropped: usize,
}

/// Binds a [`FrameOrchestrator`] to its collaborators for one stream
pub struct StreamSession {
    orchestrator: FrameOrchestrator,
    detector: Arc<dyn Detector>,
    pose: Arc<dyn PoseExtractor>,
    whitelist: Arc<dyn WhitelistGate>,
    snapshots: Arc<dyn SnapshotSink>,
    clock: Arc<dyn Clock>,
    dispatcher: AlertDispatcher,
    stats_interval: u64,
}

impl StreamSession {
    /// Create a session with no pose model, no whitelist and no snapshot storage.
    ///
    /// Spawns the alert worker, so it must be called within a Tokio runtime.
    pub fn new(config: GuardianConfig, detector: Arc<dyn Detector>, alerts: Arc<dyn AlertSink>) -> Self {
        let dispatcher = AlertDispatcher::spawn(alerts, config.dispatch.queue_capacity);
        let stats_interval = config.session.stats_interval.max(1);
        Self {
            orchestrator: FrameOrchestrator::new(config),
            detector,
            pose: Arc::new(NoPose),
            whitelist: Arc::new(NoWhitelist),
            snapshots: Arc::new(NoSnapshots),
            clock: Arc::new(SystemClock),
            dispatcher,
            stats_interval,
        }
    }

    pub fn with_pose(mut self, pose: Arc<dyn PoseExtractor>) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_whitelist(mut self, whitelist: Arc<dyn WhitelistGate>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotSink>) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn orchestrator_mut(&mut self) -> &mut FrameOrchestrator {
        &mut self.orchestrator
    }

    /// Process frames until `frames` closes, then clean up.
    ///
    /// Undecodable frames and detector failures skip the frame without
    /// touching any state. Stops early if `results` is dropped.
    pub async fn run(
        mut self,
        mut frames: mpsc::Receiver<EncodedFrame>,
        results: mpsc::Sender<FrameResult>,
    ) -> SessionSummary {
        info!("Stream session started");
        let started = Instant::now();
        let mut index: u64 = 0;
        let mut processed: u64 = 0;
        let mut skipped: u64 = 0;

        while let Some(encoded) = frames.recv().await {
            let frame_index = index;
            index += 1;

            let now = encoded.timestamp.unwrap_or_else(|| self.clock.now());
            let frame = match Frame::decode(frame_index, now, &encoded.data) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Skipping frame {}: {}", frame_index, e);
                    skipped += 1;
                    continue;
                }
            };

            let detections = match run_blocking(|| self.detector.detect(&frame)) {
                Ok(detections) => detections,
                Err(e) => {
                    warn!("Skipping frame {}: {}", frame_index, e);
                    skipped += 1;
                    continue;
                }
            };

            let collaborators = Collaborators::new(
                self.pose.as_ref(),
                self.whitelist.as_ref(),
                self.snapshots.as_ref(),
            );
            let orchestrator = &mut self.orchestrator;
            let result =
                run_blocking(|| orchestrator.process_frame(&frame, detections, collaborators));
            for alert in &result.alerts {
                self.dispatcher.dispatch(alert.clone());
            }

            processed += 1;
            if processed % self.stats_interval == 0 {
                let secs = started.elapsed().as_secs_f64();
                let fps = if secs > 0.0 { processed as f64 / secs } else { 0.0 };
                info!(
                    "Processed {} frames ({:.1} fps), {} active tracks",
                    processed, fps, result.active_tracks
                );
            }

            if results.send(result).await.is_err() {
                debug!("Result receiver closed, ending session");
                break;
            }
        }

        let tracks_cleared = self.orchestrator.end_session();
        let DispatchStats {
            delivered, dropped, ..
        } = self.dispatcher.shutdown().await;

        let summary = SessionSummary {
            frames_processed: processed,
            frames_skipped: skipped,
            tracks_cleared,
            alerts_delivered: delivered,
            alerts_dropped: dropped,
        };
        info!("Stream session finished: {:?}", summary);
        summary
    }
}

/// Run synchronous model work, yielding the worker thread when the runtime allows it
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}
