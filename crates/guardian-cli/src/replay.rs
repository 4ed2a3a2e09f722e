//! Replay a recorded stream through the engine

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

use anyhow::{Context as _, Result};
use guardian_common::{
    BoundingBox, Collaborators, Frame, GuardianError, KeypointSet, PoseExtractor, SnapshotSink,
    WhitelistGate, WhitelistVerdict,
};
use guardian_orchestrator::{
    AlertDispatcher, AlertSink, DispatchStats, FrameOrchestrator, GuardianConfig,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::parser::{read_frames, RecordedDetection, ReplayFrame};

/// Pose extractor and whitelist gate answering from the current recorded frame.
///
/// Answers are looked up by exact box; a box with no recorded answer yields
/// no keypoints and a stranger verdict.
#[derive(Debug, Default)]
pub struct RecordedCollaborators {
    current: Mutex<Vec<RecordedDetection>>,
}

impl RecordedCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `frame`'s recorded answers current
    pub fn load(&self, frame: &ReplayFrame) -> guardian_common::Result<()> {
        let mut current = self.lock()?;
        current.clone_from(&frame.detections);
        Ok(())
    }

    fn lock(&self) -> guardian_common::Result<std::sync::MutexGuard<'_, Vec<RecordedDetection>>> {
        self.current
            .lock()
            .map_err(|_| GuardianError::Other("recorded frame lock poisoned".to_string()))
    }

    fn find<T>(
        &self,
        bbox: &BoundingBox,
        answer: impl Fn(&RecordedDetection) -> Option<T>,
    ) -> guardian_common::Result<Option<T>> {
        let current = self.lock()?;
        Ok(current.iter().find(|d| d.bbox == *bbox).and_then(answer))
    }
}

impl PoseExtractor for RecordedCollaborators {
    fn extract_keypoints(
        &self,
        _frame: &Frame,
        bbox: &BoundingBox,
    ) -> guardian_common::Result<Option<KeypointSet>> {
        self.find(bbox, |d| d.keypoints.clone())
    }
}

impl WhitelistGate for RecordedCollaborators {
    fn check_face(
        &self,
        _frame: &Frame,
        bbox: &BoundingBox,
    ) -> guardian_common::Result<WhitelistVerdict> {
        Ok(self
            .find(bbox, |d| d.whitelist.clone())?
            .map(WhitelistVerdict::member)
            .unwrap_or_default())
    }
}

/// Pose sampling overrides given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseOverrides {
    pub disabled: bool,
    pub interval: Option<u32>,
}

/// Totals of one replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub frames: u64,
    pub skipped_lines: u64,
    pub alerts: usize,
    pub tracks_cleared: usize,
    pub alerts_delivered: usize,
    pub alerts_dropped: usize,
}

/// Feed every frame of `input` through a fresh orchestrator.
///
/// Each frame result is written to `output` as one JSON line; alerts also go
/// to `alerts` through the dispatch queue. Must run within a Tokio runtime.
pub async fn replay<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: GuardianConfig,
    pose: PoseOverrides,
    snapshots: Arc<dyn SnapshotSink>,
    alerts: Arc<dyn AlertSink>,
) -> Result<ReplaySummary> {
    let mut dispatcher = AlertDispatcher::spawn(alerts, config.dispatch.queue_capacity);
    let mut orchestrator = FrameOrchestrator::new(config);
    if pose.disabled {
        orchestrator.set_pose_enabled(false);
    }
    if let Some(interval) = pose.interval {
        orchestrator.set_pose_interval(interval);
    }

    let recorded = RecordedCollaborators::new();
    let mut summary = ReplaySummary::default();
    let mut last_timestamp = f64::NEG_INFINITY;

    for parsed in read_frames(input) {
        let frame = match parsed {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping line: {}", e);
                summary.skipped_lines += 1;
                continue;
            }
        };
        if frame.timestamp < last_timestamp {
            warn!(
                "Timestamp {} goes back in time (previous {})",
                frame.timestamp, last_timestamp
            );
        }
        last_timestamp = frame.timestamp;

        recorded.load(&frame)?;
        let handle = Frame::without_image(summary.frames, frame.timestamp);
        let collaborators = Collaborators::new(&recorded, &recorded, snapshots.as_ref());
        let result = orchestrator.process_frame(&handle, frame.detections(), collaborators);
        summary.frames += 1;

        for alert in &result.alerts {
            summary.alerts += 1;
            dispatcher.dispatch(alert.clone());
        }

        let line = serde_json::to_string(&result).context("Failed to serialize frame result")?;
        writeln!(output, "{}", line).context("Failed to write frame result")?;
    }

    summary.tracks_cleared = orchestrator.end_session();
    let DispatchStats {
        delivered, dropped, ..
    } = dispatcher.shutdown().await;
    summary.alerts_delivered = delivered;
    summary.alerts_dropped = dropped;

    info!(
        "Replayed {} frames ({} lines skipped), {} alerts",
        summary.frames, summary.skipped_lines, summary.alerts
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    #[test]
    fn test_recorded_answers_by_box() {
        let frame = parse_line(
            1,
            r#"{"timestamp": 0, "detections": [
                {"box": [0, 0, 10, 10], "label": "person", "score": 0.9, "whitelist": "mom"},
                {"box": [50, 0, 60, 10], "label": "person", "score": 0.9, "keypoints": [[1, 2, 0.5]]}
            ]}"#,
        )
        .unwrap()
        .unwrap();

        let recorded = RecordedCollaborators::new();
        recorded.load(&frame).unwrap();
        let handle = Frame::without_image(0, 0.0);

        let mom = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let other = BoundingBox::new(50.0, 0.0, 60.0, 10.0);
        assert_eq!(
            recorded.check_face(&handle, &mom).unwrap(),
            WhitelistVerdict::member("mom")
        );
        assert!(!recorded.check_face(&handle, &other).unwrap().is_member);
        assert!(recorded.extract_keypoints(&handle, &mom).unwrap().is_none());
        assert_eq!(
            recorded
                .extract_keypoints(&handle, &other)
                .unwrap()
                .map(|k| k.len()),
            Some(1)
        );
    }

    #[test]
    fn test_load_replaces_previous_frame() {
        let recorded = RecordedCollaborators::new();
        let first = parse_line(
            1,
            r#"{"timestamp": 0, "detections": [{"box": [0, 0, 10, 10], "label": "person", "score": 0.9, "whitelist": "mom"}]}"#,
        )
        .unwrap()
        .unwrap();
        recorded.load(&first).unwrap();
        recorded
            .load(&parse_line(2, r#"{"timestamp": 1}"#).unwrap().unwrap())
            .unwrap();

        let handle = Frame::without_image(1, 1.0);
        let verdict = recorded
            .check_face(&handle, &BoundingBox::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        assert!(!verdict.is_member);
    }
}
