// src/lib.rs

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod flow;
pub mod flows;
pub mod logging;
pub mod pipeline;
pub mod task;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::backend::{BackendConfig, BackendSettings, HealthCheck, HttpHealthCheck, ensure_backend};
use crate::cli::{CliArgs, FlowCommand};
use crate::config::{FlowFile, default_config_path, load_and_validate};
use crate::errors::FlowdagError;
use crate::flow::{Flow, FlowResult};
use crate::flows::{FlowContext, ReproOptions, StageOptions, file_flow, repro_flow, stage_flow};

/// Process exit code when every task succeeded.
pub const EXIT_OK: i32 = 0;
/// Process exit code when a flow failed or setup went wrong.
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code when the backend is not reachable (`EX_SOFTWARE`).
pub const EXIT_BACKEND_UNAVAILABLE: i32 = 70;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - project root discovery
/// - backend resolution + health probe
/// - flow construction and execution
pub async fn run(args: CliArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let root = match &args.project_root {
        Some(root) => root.clone(),
        None => discover_project_root(&cwd),
    };
    info!(root = %root.display(), "project root");

    if let FlowCommand::Run {
        config,
        dry_run: true,
    } = &args.command
    {
        let path = config.clone().unwrap_or_else(|| default_config_path(&root));
        let file = load_and_validate(&path)?;
        print_dry_run(&file);
        return Ok(EXIT_OK);
    }

    let mut settings = BackendSettings::default();
    if let Some(host) = &args.backend_host {
        settings.host = host.clone();
    }
    if let Some(port) = args.backend_port {
        settings.port = port;
    }
    let backend = BackendConfig::resolve(&root, &settings)?;

    let timeout = Duration::try_from_secs_f64(args.probe_timeout).map_err(|e| {
        FlowdagError::ConfigError(format!(
            "--probe-timeout must be a non-negative number of seconds: {e}"
        ))
    })?;
    let check = HttpHealthCheck::new(&backend, timeout);

    execute_command(FlowContext::new(backend), &check, &args.command).await
}

/// Probe the backend, then build and run the flow selected by `command`.
///
/// Nothing runs when the backend is down.
pub async fn execute_command(
    ctx: FlowContext,
    check: &dyn HealthCheck,
    command: &FlowCommand,
) -> Result<i32> {
    match ensure_backend(check).await {
        Ok(()) => {}
        Err(err @ FlowdagError::BackendUnavailable { .. }) => {
            error!("{err}");
            return Ok(EXIT_BACKEND_UNAVAILABLE);
        }
        Err(err) => return Err(err.into()),
    }

    let flow = build_flow(&ctx, command)?;
    let result = flow.execute().await;
    report(&result);

    Ok(if result.is_success() {
        EXIT_OK
    } else {
        EXIT_FAILURE
    })
}

/// Build the flow for a subcommand without running it.
pub fn build_flow(ctx: &FlowContext, command: &FlowCommand) -> Result<Flow> {
    let flow = match command {
        FlowCommand::Repro {
            fail_once,
            show_metrics,
            command,
        } => {
            let mut opts = ReproOptions {
                fail_once: *fail_once,
                show_metrics: *show_metrics,
                ..ReproOptions::default()
            };
            if let Some(argv) = command {
                opts.command = argv.clone();
            }
            repro_flow(ctx, &opts)?
        }
        FlowCommand::Stages { fail_once } => stage_flow(
            ctx,
            &StageOptions {
                fail_once: *fail_once,
                ..StageOptions::default()
            },
        ),
        FlowCommand::Run { config, .. } => {
            let path = config
                .clone()
                .unwrap_or_else(|| default_config_path(ctx.layout().root()));
            let file = load_and_validate(&path)
                .with_context(|| format!("loading flow file {}", path.display()))?;
            file_flow(ctx, &file)?
        }
    };
    debug!(flow = %flow.name(), tasks = ?flow.task_names().collect::<Vec<_>>(), "built flow");
    Ok(flow)
}

/// Nearest ancestor of `start` (inclusive) containing `.git`, else `start`.
pub fn discover_project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}

fn report(result: &FlowResult) {
    if result.is_success() {
        info!(flow = %result.name(), tasks = result.len(), "flow finished successfully");
    } else {
        error!(
            flow = %result.name(),
            failed_task = result.failed_task().unwrap_or("<none>"),
            "flow failed"
        );
    }
}

/// Simple dry-run output: print tasks in run order with deps and commands.
fn print_dry_run(file: &FlowFile) {
    println!("flowdag dry-run");
    println!("  flow = {:?}", file.name);
    println!();

    println!("tasks ({}, in run order):", file.tasks.len());
    for task in &file.tasks {
        println!("  - {}", task.name);
        println!("      cmd: {}", task.cmd);
        if let Some(ref cwd) = task.cwd {
            println!("      cwd: {}", cwd.display());
        }
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if task.policy.max_attempts() > 1 {
            println!(
                "      attempts: {} (delay {:?})",
                task.policy.max_attempts(),
                task.policy.delay()
            );
        }
        if !task.enabled {
            println!("      enabled: false");
        }
        if task.fail_once {
            println!("      fail_once: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
