// src/backend/probe.rs

//! Backend health probing.
//!
//! An unreachable backend is an expected condition, so the probe reports a
//! `bool` and never an error. [`ensure_backend`] turns a negative answer into
//! [`FlowdagError::BackendUnavailable`] for callers that must abort.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::config::BackendConfig;
use crate::errors::{FlowdagError, Result};

/// Default time budget for a health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Trait abstracting "is the backend up?".
///
/// Production code uses [`HttpHealthCheck`]; tests can substitute a fixed
/// answer.
pub trait HealthCheck: Send + Sync {
    fn is_up(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Where the check looks, for diagnostics.
    fn target(&self) -> String;
}

/// HTTP `GET` against the backend's health endpoint.
#[derive(Debug, Clone)]
pub struct HttpHealthCheck {
    url: String,
    timeout: Duration,
}

impl HttpHealthCheck {
    pub fn new(config: &BackendConfig, timeout: Duration) -> Self {
        Self {
            url: config.health_url(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HealthCheck for HttpHealthCheck {
    fn is_up(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(probe_url(&self.url, self.timeout))
    }

    fn target(&self) -> String {
        self.url.clone()
    }
}

/// Return `true` if the backend answers its health endpoint with a 2xx
/// status within `timeout`.
pub async fn probe(config: &BackendConfig, timeout: Duration) -> bool {
    probe_url(&config.health_url(), timeout).await
}

async fn probe_url(url: &str, timeout: Duration) -> bool {
    // The backend is local; never route the probe through a proxy.
    let client = match reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .no_proxy()
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "could not build HTTP client for health probe");
            return false;
        }
    };

    match client.get(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            debug!(url, status = status.as_u16(), "health probe answered");
            status.is_success()
        }
        Err(e) => {
            debug!(url, error = %e, "health probe failed");
            false
        }
    }
}

/// Fail with `BackendUnavailable` unless `check` reports the backend as up.
pub async fn ensure_backend(check: &dyn HealthCheck) -> Result<()> {
    if check.is_up().await {
        info!(url = %check.target(), "backend is up");
        return Ok(());
    }

    let url = check.target();
    warn!(%url, "backend unavailable");
    Err(FlowdagError::BackendUnavailable { url })
}
