// src/backend/mod.rs

//! Execution backend locator.
//!
//! - [`config`] derives the project-scoped `BackendConfig` (paths, connection
//!   string, URLs, client environment) and creates its directories.
//! - [`probe`] checks the health endpoint with a bounded timeout.

pub mod config;
pub mod probe;

pub use config::{BackendConfig, BackendSettings};
pub use probe::{DEFAULT_PROBE_TIMEOUT, HealthCheck, HttpHealthCheck, ensure_backend, probe};
