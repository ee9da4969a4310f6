// src/logging.rs

//! Logging setup for `flowdag` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `FLOWDAG_LOG` environment variable, either a level ("debug") or
//!    `EnvFilter` directives ("flowdag=debug,reqwest=warn")
//! 3. default to `info`
//!
//! Logs go to STDERR so that stdout stays free for dry-run output.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "FLOWDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let directives = filter_directives(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("ignoring {LOG_ENV_VAR}={directives:?}: {e}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn filter_directives(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if let Some(lvl) = cli_level {
        return level_name(lvl).to_string();
    }

    let Some(value) = env_value.map(str::trim).filter(|v| !v.is_empty()) else {
        return DEFAULT_DIRECTIVE.to_string();
    };

    let lowered = value.to_lowercase();
    match lowered.as_str() {
        "warning" => "warn".to_string(),
        "error" | "warn" | "info" | "debug" | "trace" | "off" => lowered,
        // A bare word would be read as a target name and silence everything else.
        _ if !value.contains(['=', ',', ':']) => DEFAULT_DIRECTIVE.to_string(),
        _ => value.to_string(),
    }
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
