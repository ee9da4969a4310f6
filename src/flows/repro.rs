// src/flows/repro.rs

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::errors::Result;
use crate::exec::Command;
use crate::flow::Flow;
use crate::flows::FlowContext;
use crate::pipeline::read_metrics_value;
use crate::task::{FailOnce, RetryPolicy, Task, TaskBody};

pub const REPRO_FAIL_ONCE_KEY: &str = "flowdag_repro_fail_once";

#[derive(Debug, Clone)]
pub struct ReproOptions {
    /// Fail the first repro attempt ever made against the marker store.
    pub fail_once: bool,
    /// Append the metrics summary task.
    pub show_metrics: bool,
    /// Pipeline reproduction command, run in the project root.
    pub command: Vec<String>,
    pub retry_delay: Duration,
}

impl Default for ReproOptions {
    fn default() -> Self {
        Self {
            fail_once: false,
            show_metrics: false,
            command: vec!["dvc".to_string(), "repro".to_string()],
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// `repro` (one retry) followed by `metrics summary` when enabled.
pub fn repro_flow(ctx: &FlowContext, opts: &ReproOptions) -> Result<Flow> {
    let command = Command::new(opts.command.iter().cloned(), ctx.layout().root())?;

    let mut repro = Task::new("repro")
        .with_description(format!("pipeline reproduction ({command})"))
        .with_retry(RetryPolicy::with_retries(1, opts.retry_delay))
        .with_body(TaskBody::shell(command))
        .with_runner(ctx.runner());
    if opts.fail_once {
        repro = repro.with_fail_once(FailOnce::new(ctx.markers(), REPRO_FAIL_ONCE_KEY));
    }

    let metrics_path = ctx.layout().metrics();
    let summary = Task::new("metrics summary")
        .with_body(TaskBody::native(move || metrics_summary(&metrics_path)))
        .enabled(opts.show_metrics);

    Ok(Flow::new("repro").add(repro).add(summary))
}

/// Log the metrics report as compact JSON with sorted keys.
pub fn metrics_summary(path: &Path) -> anyhow::Result<()> {
    let metrics = read_metrics_value(path)?;
    info!("Metrics: {}", serde_json::to_string(&metrics)?);
    Ok(())
}
