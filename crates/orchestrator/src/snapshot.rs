//! Reference snapshot sink: JPEG crops plus a JSON-lines detection log

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Local;
use guardian_common::{
    BoundingBox, GuardianError, Result, SnapshotRequest, SnapshotSink, TrackId,
};
use image::{imageops, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Name of the detection log inside the snapshot directory
pub const DETECTION_LOG: &str = "detections.jsonl";

/// Relative padding added on each side of a crop
const CROP_PADDING: f32 = 0.1;

/// One line of the detection log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub id: u64,
    pub track_id: Option<TrackId>,
    /// Saved image, absent when the frame carried no pixels
    pub path: Option<PathBuf>,
    /// `loitering` for alerts, `simple_pass` otherwise
    pub detection_type: String,
    pub stay_duration: f64,
    pub confidence: f32,
    pub created_at: String,
}

/// Writes region crops as JPEG files and logs every record
#[derive(Debug)]
pub struct JpegSnapshotSink {
    dir: PathBuf,
    model_input_size: u32,
    next_id: AtomicU64,
    log: Mutex<()>,
}

impl JpegSnapshotSink {
    /// Create the sink, creating `dir` if needed
    pub fn new(dir: impl AsRef<Path>, model_input_size: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        info!("Saving snapshots to {}", dir.display());
        Ok(Self {
            dir,
            model_input_size: model_input_size.max(1),
            next_id: AtomicU64::new(1),
            log: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(DETECTION_LOG)
    }

    /// Read back every record of the detection log
    pub fn records(&self) -> Result<Vec<SnapshotRecord>> {
        let contents = match std::fs::read_to_string(self.log_path()) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(GuardianError::from))
            .collect()
    }

    fn append_record(&self, record: &SnapshotRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        let _guard = self
            .log
            .lock()
            .map_err(|_| GuardianError::Snapshot("detection log lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl SnapshotSink for JpegSnapshotSink {
    fn persist(&self, request: &SnapshotRequest<'_>) -> Result<Option<u64>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Local::now();
        let prefix = if request.is_alert { "loiterer" } else { "person" };

        let path = match request.frame.image.as_deref() {
            Some(image) => {
                let filename = format!("{}_{}_{}.jpg", prefix, now.format("%Y%m%d_%H%M%S"), id);
                let path = self.dir.join(filename);
                let region = request
                    .bbox
                    .and_then(|b| crop_region(&b, image.width(), image.height(), self.model_input_size));
                let snapshot: RgbImage = match region {
                    Some((x, y, w, h)) => imageops::crop_imm(image, x, y, w, h).to_image(),
                    None => image.clone(),
                };
                snapshot.save_with_format(&path, ImageFormat::Jpeg)?;
                Some(path)
            }
            None => None,
        };

        let record = SnapshotRecord {
            id,
            track_id: request.track_id,
            path,
            detection_type: if request.is_alert {
                "loitering".to_string()
            } else {
                "simple_pass".to_string()
            },
            stay_duration: request.dwell_secs,
            confidence: request.score,
            created_at: now.to_rfc3339(),
        };
        self.append_record(&record)?;

        info!(
            "{} snapshot #{} saved (dwell {:.1}s)",
            if request.is_alert { "Alert" } else { "Person" },
            id,
            request.dwell_secs
        );
        Ok(Some(id))
    }
}

/// Map a model-input box onto a `width` x `height` frame, pad it and clamp it.
///
/// Returns `(x, y, w, h)` in pixels, or `None` when nothing is left to crop.
pub fn crop_region(
    bbox: &BoundingBox,
    width: u32,
    height: u32,
    model_input_size: u32,
) -> Option<(u32, u32, u32, u32)> {
    let input = model_input_size.max(1) as f32;
    let scaled = bbox.scale(width as f32 / input, height as f32 / input);
    let pad_x = scaled.width() * CROP_PADDING;
    let pad_y = scaled.height() * CROP_PADDING;

    let x1 = (scaled.x1 - pad_x).max(0.0).floor() as u32;
    let y1 = (scaled.y1 - pad_y).max(0.0).floor() as u32;
    let x2 = ((scaled.x2 + pad_x).max(0.0).floor() as u32).min(width);
    let y2 = ((scaled.y2 + pad_y).max(0.0).floor() as u32).min(height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some((x1, y1, x2 - x1, y2 - y1))
}
