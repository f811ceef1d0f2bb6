//! dive-locomotion — headless driver for hand-gesture dive locomotion.
//!
//! Replays hand, touch and aim commands through the locomotion state and
//! prints the responses.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use dive_locomotion::backend::headless::{self, HeadlessConfig};
use dive_locomotion::{LocomotionConfig, LocomotionState};

#[derive(Parser, Debug)]
#[command(name = "dive-locomotion", about = "VR dive locomotion replay driver")]
struct Cli {
    /// Command script, one s-expression per line (default: stdin)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Locomotion config file (s-expression plist)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame rate for `run` commands that give no :hz
    #[arg(long)]
    tick_hz: Option<f64>,

    /// Log a status line every N simulated frames (0 disables)
    #[arg(long, default_value_t = 900)]
    status_every: u64,

    /// Print the final status s-expression after the script
    #[arg(long)]
    print_status: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("dive-locomotion {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Logs go to stderr so responses on stdout stay parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dive_locomotion=info".into()),
        )
        .init();

    info!("dive-locomotion v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => LocomotionConfig::load(path)?,
        None => LocomotionConfig::default(),
    };
    if let Some(hz) = cli.tick_hz {
        if hz <= 0.0 {
            anyhow::bail!("--tick-hz must be positive, got {}", hz);
        }
        config.tick_hz = hz;
    }

    let state = LocomotionState::new(config);
    headless::run(
        state,
        HeadlessConfig {
            script: cli.script,
            status_interval_frames: cli.status_every,
            print_status: cli.print_status,
        },
    )
    .context("headless replay")
}
