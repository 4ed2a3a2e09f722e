//! Config command implementation

use anyhow::{Context as _, Result};
use clap::Args;
use guardian_orchestrator::GuardianConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct ConfigCommand {
    /// Validate and print this file instead of the defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the YAML here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ConfigCommand {
    pub async fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => GuardianConfig::from_yaml(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => GuardianConfig::default(),
        };
        let yaml = config.to_yaml().context("Failed to serialize config")?;

        match self.output {
            Some(path) => {
                tokio::fs::write(&path, yaml)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote config to {}", path.display());
            }
            None => print!("{}", yaml),
        }
        Ok(())
    }
}
