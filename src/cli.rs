// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `flowdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "flowdag",
    version,
    about = "Run small task flows with retries against a project-scoped backend.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root. Default: nearest ancestor of the current directory
    /// containing `.git`, else the current directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Health probe timeout in seconds.
    #[arg(long, global = true, value_name = "SECONDS", default_value_t = 1.5)]
    pub probe_timeout: f64,

    /// Backend host.
    #[arg(long, global = true, value_name = "HOST")]
    pub backend_host: Option<String>,

    /// Backend port.
    #[arg(long, global = true, value_name = "PORT")]
    pub backend_port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FLOWDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: FlowCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum FlowCommand {
    /// Run the pipeline reproduction command, then optionally summarise metrics.
    Repro {
        /// Fail the first attempt once to show retries.
        #[arg(long)]
        fail_once: bool,

        /// Log the metrics report after a successful reproduction.
        #[arg(long, alias = "show_metrics")]
        show_metrics: bool,

        /// Reproduction command and its arguments. Default: `dvc repro`.
        #[arg(long, value_name = "ARG", num_args = 1.., allow_hyphen_values = true)]
        command: Option<Vec<String>>,
    },

    /// Run prepare -> train -> evaluate in process.
    Stages {
        /// Fail the first train attempt once to show retries.
        #[arg(long)]
        fail_once: bool,
    },

    /// Run the shell tasks of a flow file.
    Run {
        /// Path to the flow file. Default: `Flowdag.toml` in the project root.
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Parse + validate, print the tasks in run order, don't execute.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
