//! Guardian CLI - surveillance alert engine tooling
//!
//! Replays recorded detection streams and manages engine configuration.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::config::ConfigCommand;
use commands::replay::ReplayCommand;

#[derive(Parser)]
#[command(
    name = "guardian",
    version,
    about = "Loitering, abnormal behavior and fire/smoke alerting",
    after_help = "EXAMPLES:\n  \
                  # Replay a recording with default settings\n  \
                  guardian replay camera1.jsonl\n\n  \
                  # Custom thresholds, keep snapshot records\n  \
                  guardian replay --config guardian.yaml --snapshots ./captures camera1.jsonl\n\n  \
                  # Write the default configuration\n  \
                  guardian config --output guardian.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded detection stream through the engine, printing one JSON result per frame
    Replay(ReplayCommand),

    /// Print or write the engine configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    // stdout carries frame results
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Replay(cmd) => cmd.execute().await,
        Commands::Config(cmd) => cmd.execute().await,
    }
}
