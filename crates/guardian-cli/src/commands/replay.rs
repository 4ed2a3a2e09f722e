//! Replay command implementation

use anyhow::{Context as _, Result};
use clap::Args;
use guardian_common::{NoSnapshots, SnapshotSink};
use guardian_orchestrator::{GuardianConfig, JpegSnapshotSink, TracingAlertSink};
use guardian_cli::{replay, PoseOverrides};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write as _};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args)]
pub struct ReplayCommand {
    /// Recorded detections (JSON lines, one frame per line)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Engine configuration (YAML); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for snapshot records
    #[arg(long, value_name = "DIR")]
    snapshots: Option<PathBuf>,

    /// Run pose extraction every N frames (clamped to 1..=30)
    #[arg(long)]
    pose_interval: Option<u32>,

    /// Skip pose extraction entirely
    #[arg(long)]
    disable_pose: bool,

    /// Print the run summary as JSON on stderr when done
    #[arg(long)]
    summary: bool,
}

impl ReplayCommand {
    pub async fn execute(self) -> Result<()> {
        if !self.input.exists() {
            anyhow::bail!("Input file does not exist: {}", self.input.display());
        }

        let config = match &self.config {
            Some(path) => GuardianConfig::from_yaml(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => GuardianConfig::default(),
        };

        let snapshots: Arc<dyn SnapshotSink> = match &self.snapshots {
            Some(dir) => {
                info!("Snapshots: {}", dir.display());
                Arc::new(
                    JpegSnapshotSink::new(dir, config.frame.model_input_size)
                        .context("Failed to open snapshot directory")?,
                )
            }
            None => Arc::new(NoSnapshots),
        };

        let input = File::open(&self.input)
            .with_context(|| format!("Failed to open {}", self.input.display()))?;
        info!("Replaying {}", self.input.display());

        let pose = PoseOverrides {
            disabled: self.disable_pose,
            interval: self.pose_interval,
        };
        let mut stdout = BufWriter::new(io::stdout());
        let summary = replay(
            BufReader::new(input),
            &mut stdout,
            config,
            pose,
            snapshots,
            Arc::new(TracingAlertSink),
        )
        .await?;
        stdout.flush().context("Failed to flush frame results")?;

        if self.summary {
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Ok(())
    }
}
