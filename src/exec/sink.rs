// src/exec/sink.rs

//! Destination for the output lines of external processes.

use tracing::info;

/// Receives each non-empty output line of a running process as it arrives.
///
/// Production code uses [`TracingSink`]; tests can record lines instead.
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Forwards process output into the `tracing` pipeline.
///
/// Lines are emitted inside the caller's span, so the owning task's name shows
/// up next to every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn line(&self, line: &str) {
        info!(target: "flowdag::output", "{line}");
    }
}
