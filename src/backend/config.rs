// src/backend/config.rs

//! Project-scoped backend configuration.
//!
//! All backend state (home directory, local storage, database file) lives
//! under `<project_root>/.flowdag/`, so nothing is written to the user's home
//! directory. The resulting [`BackendConfig`] is a plain value that callers
//! hand to the components that need it; nothing here touches the process
//! environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::errors::Result;

/// Environment variable names exported to backend clients.
pub const ENV_HOME: &str = "FLOWDAG_HOME";
pub const ENV_LOCAL_STORAGE_PATH: &str = "FLOWDAG_LOCAL_STORAGE_PATH";
pub const ENV_DATABASE_CONNECTION_URL: &str = "FLOWDAG_API_DATABASE_CONNECTION_URL";
pub const ENV_API_URL: &str = "FLOWDAG_API_URL";
pub const ENV_RESULTS_PERSIST_BY_DEFAULT: &str = "FLOWDAG_RESULTS_PERSIST_BY_DEFAULT";

/// Tunables for where the backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackendSettings {
    /// Directory under the project root holding all backend state.
    #[serde(default = "default_dir_name")]
    pub dir_name: String,

    /// Database file name inside the backend home directory.
    #[serde(default = "default_db_filename")]
    pub db_filename: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_dir_name() -> String {
    ".flowdag".to_string()
}

fn default_db_filename() -> String {
    "flowdag.db".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4200
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            dir_name: default_dir_name(),
            db_filename: default_db_filename(),
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Resolved backend identity for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    project_root: PathBuf,
    host: String,
    port: u16,
    home_dir: PathBuf,
    storage_dir: PathBuf,
    db_connection_string: String,
}

impl BackendConfig {
    /// Derive the configuration for `project_root` and make sure the home and
    /// storage directories exist.
    ///
    /// Deterministic for a given root and settings; calling it again is a
    /// no-op on disk.
    pub fn resolve(project_root: impl AsRef<Path>, settings: &BackendSettings) -> Result<Self> {
        let project_root = std::path::absolute(project_root.as_ref()).with_context(|| {
            format!("resolving project root {:?}", project_root.as_ref())
        })?;

        let home_dir = project_root.join(&settings.dir_name);
        let storage_dir = home_dir.join("storage");
        ensure_dir(&home_dir)?;
        ensure_dir(&storage_dir)?;

        let db_connection_string = format!(
            "sqlite:///{}",
            home_dir.join(&settings.db_filename).display()
        );

        debug!(
            root = %project_root.display(),
            home = %home_dir.display(),
            "resolved backend configuration"
        );

        Ok(Self {
            project_root,
            host: settings.host.clone(),
            port: settings.port,
            home_dir,
            storage_dir,
            db_connection_string,
        })
    }

    /// [`BackendConfig::resolve`] with default settings.
    pub fn for_project(project_root: impl AsRef<Path>) -> Result<Self> {
        Self::resolve(project_root, &BackendSettings::default())
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn db_connection_string(&self) -> &str {
        &self.db_connection_string
    }

    pub fn api_url(&self) -> String {
        format!("http://{}:{}/api", self.host, self.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.api_url())
    }

    /// Variables backend clients need, passed explicitly to child processes.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![
            (ENV_RESULTS_PERSIST_BY_DEFAULT.to_string(), "true".to_string()),
            (ENV_HOME.to_string(), self.home_dir.display().to_string()),
            (
                ENV_LOCAL_STORAGE_PATH.to_string(),
                self.storage_dir.display().to_string(),
            ),
            (
                ENV_DATABASE_CONNECTION_URL.to_string(),
                self.db_connection_string.clone(),
            ),
            (ENV_API_URL.to_string(), self.api_url()),
        ]
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("creating directory {:?}", path))?;
    Ok(())
}
