//! Recorded stream parser
//!
//! A recording is a JSON-lines file, one frame per line:
//!
//! ```text
//! {"timestamp": 12.5, "detections": [
//!     {"box": [10, 20, 60, 170], "label": "person", "score": 0.91,
//!      "keypoints": [[x, y, visibility], ...], "whitelist": "mom"},
//!     {"box": [0, 0, 40, 40], "label": "fire", "score": 0.7}
//! ]}
//! ```
//!
//! `keypoints` and `whitelist` are optional; they stand in for the pose model
//! and the face gate when the recording is replayed. Blank lines and lines
//! starting with `#` are ignored.

use std::io::BufRead;

use guardian_common::{BoundingBox, Detection, KeypointSet, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON at line {line}: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid frame at line {line}: {message}")]
    InvalidFrame { line: usize, message: String },

    #[error("Failed to read line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// One detection of a recorded frame, with the collaborator answers recorded for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedDetection {
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub label: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<KeypointSet>,
    /// Name of the resident this person was recognized as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<String>,
}

impl RecordedDetection {
    pub fn detection(&self) -> Detection {
        Detection::new(self.bbox, self.label.clone(), self.score)
    }
}

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub detections: Vec<RecordedDetection>,
}

impl ReplayFrame {
    pub fn detections(&self) -> Vec<Detection> {
        self.detections.iter().map(RecordedDetection::detection).collect()
    }
}

/// Parse one line (1-based `line` for error messages).
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ReplayFrame>, ParseError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let frame: ReplayFrame =
        serde_json::from_str(text).map_err(|source| ParseError::InvalidJson { line, source })?;

    if !frame.timestamp.is_finite() {
        return Err(ParseError::InvalidFrame {
            line,
            message: format!("timestamp must be finite, got {}", frame.timestamp),
        });
    }
    if let Some(det) = frame
        .detections
        .iter()
        .find(|d| !(0.0..=1.0).contains(&d.score))
    {
        return Err(ParseError::InvalidFrame {
            line,
            message: format!("score of '{}' must be in [0, 1], got {}", det.label, det.score),
        });
    }
    Ok(Some(frame))
}

/// Parse every line of a recording, yielding frames and per-line errors in order
pub fn read_frames<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<ReplayFrame, ParseError>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line_no = i + 1;
            match line {
                Ok(text) => parse_line(line_no, &text).transpose(),
                Err(source) => Some(Err(ParseError::Io {
                    line: line_no,
                    source,
                })),
            }
        })
}
