//! Stress harness for the framescope engine.
//!
//! Drives the worst-case instrumentation pattern: a parent scope that
//! enters and exits a child scope 100 000 times every frame, so each
//! frame commits one aggregated sample built from 100 000 guard drops.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p framescope-stress --release
//! cargo run -p framescope-stress --release -- 1000
//! ```
//!
//! The optional argument is the number of frames to run. On exit the
//! parent scope's history is written next to the working directory as a
//! baseline file for later comparison.

use std::fs;

use anyhow::Context;
use tracing::info;

use framescope::{profile_scope, FrameController};

/// Child-scope entries per frame.
const CHILD_CALLS_PER_FRAME: usize = 100_000;

/// Frames to run when no count is given.
const DEFAULT_FRAMES: u64 = 300;

fn child_function(profiler: &FrameController) {
    profile_scope!(profiler, "Child Function");
}

fn parent_function(profiler: &FrameController) {
    profile_scope!(profiler, "Parent Function");

    for _ in 0..CHILD_CALLS_PER_FRAME {
        child_function(profiler);
    }
}

fn log_stats(profiler: &FrameController) {
    for handle in profiler.handles() {
        let Some(name) = profiler.scope_name(handle) else {
            continue;
        };
        let Some(windowed) = profiler.windowed(handle) else {
            continue;
        };
        let Some(lifetime) = profiler.lifetime(handle) else {
            continue;
        };
        info!(
            scope = %name,
            current_ms = windowed.last,
            avg_ms = windowed.average,
            min_ms = windowed.min,
            max_ms = windowed.max,
            lifetime_avg_ms = lifetime.average,
            samples = lifetime.total_count,
            invocations = profiler.last_invocations(handle).unwrap_or(0),
            "frame stats"
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    framescope::raise_thread_priority();

    let frames = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be an integer, got '{arg}'"))?,
        None => DEFAULT_FRAMES,
    };

    let profiler = FrameController::new();
    info!(frames, calls_per_frame = CHILD_CALLS_PER_FRAME, "starting stress run");

    for frame in 1..=frames {
        profiler.begin_frame()?;
        parent_function(&profiler);
        profiler.end_frame()?;

        if frame % 100 == 0 {
            info!(frame, "checkpoint");
            log_stats(&profiler);
        }
    }

    for handle in profiler.handles() {
        let Some(name) = profiler.scope_name(handle) else {
            continue;
        };
        if name != "Parent Function" {
            continue;
        }
        let image = profiler.encode_scope(handle)?;
        let path = format!("[{name}].baseline");
        fs::write(&path, &image).with_context(|| format!("writing baseline to {path}"))?;
        info!(path = %path, bytes = image.len(), "baseline saved");
    }

    Ok(())
}
