//! Headless backend — replays a command script against the locomotion state.
//!
//! One s-expression per line, read from a file or stdin.  Blank lines and
//! lines starting with `;` are skipped.  Every response is written to the
//! output, one per line, and the state is summarized periodically in the log.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use crate::ipc;
use crate::state::LocomotionState;

/// Headless replay configuration.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Script path; `None` reads stdin.
    pub script: Option<PathBuf>,
    /// Log a status line every this many simulated frames (0 disables).
    pub status_interval_frames: u64,
    /// Print the final status s-expression after the script ends.
    pub print_status: bool,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            script: None,
            status_interval_frames: 900,
            print_status: false,
        }
    }
}

/// Totals for one replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub commands: u64,
    pub errors: u64,
}

/// Feed every command line from `input` through dispatch, writing each
/// response to `output`.
pub fn replay(
    state: &mut LocomotionState,
    input: impl BufRead,
    output: &mut impl Write,
    status_interval_frames: u64,
) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut last_status_frame = state.frame;

    for (lineno, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("reading script line {}", lineno + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        summary.commands += 1;
        if let Some(response) = ipc::handle_message(state, trimmed) {
            if response.contains(":status :error") {
                summary.errors += 1;
                warn!("Script line {}: {}", lineno + 1, response);
            }
            writeln!(output, "{}", response).context("writing response")?;
        }

        if status_interval_frames > 0
            && state.frame - last_status_frame >= status_interval_frames
        {
            let p = state.rig.position;
            info!(
                "Headless status: frame {}, t={:.2}s, position ({:.2}, {:.2}, {:.2}), {} stroke(s), {} impulse(s)",
                state.frame,
                state.clock_s,
                p.x,
                p.y,
                p.z,
                state.strokes.strokes_detected(),
                state.impulses.started,
            );
            last_status_frame = state.frame;
        }
    }

    output.flush().context("flushing output")?;
    Ok(summary)
}

/// Run the locomotion state headless over the configured script.
pub fn run(mut state: LocomotionState, config: HeadlessConfig) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = match &config.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening script {}", path.display()))?;
            info!("Replaying script {}", path.display());
            replay(&mut state, BufReader::new(file), &mut out, config.status_interval_frames)?
        }
        None => {
            info!("Reading commands from stdin");
            replay(&mut state, io::stdin().lock(), &mut out, config.status_interval_frames)?
        }
    };

    if config.print_status {
        writeln!(out, "{}", state.status_sexp()).context("writing status")?;
    }

    info!(
        "Headless replay finished: {} command(s), {} error(s), {} frame(s), {:.2}m travelled",
        summary.commands, summary.errors, state.frame, state.rig.distance_travelled,
    );
    Ok(())
}
