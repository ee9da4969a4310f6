// src/errors.rs

//! Crate-wide error type and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowdagError {
    #[error("Command failed (rc={exit_code}): {command}")]
    Execution { exit_code: i32, command: String },

    #[error("Backend unavailable at {url}")]
    BackendUnavailable { url: String },

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Retries exhausted after {attempts} attempt(s): {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in flow: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowdagError {
    /// Whether another attempt of the same task body can possibly succeed.
    ///
    /// A missing upstream artifact will still be missing on the next attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FlowdagError::ArtifactNotFound(_))
    }
}

/// Retryability of an arbitrary task body error.
///
/// Errors that are not a [`FlowdagError`] anywhere in their chain are treated
/// as retryable.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<FlowdagError>())
        .all(FlowdagError::is_retryable)
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowdagError>;
