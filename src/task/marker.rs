// src/task/marker.rs

//! Durable markers that survive process restarts.
//!
//! The only user today is [`FailOnce`]: a task that must fail on its very
//! first attempt and succeed on every later one, even when the later attempt
//! happens in a fresh process. An in-memory counter cannot express that, so
//! the state lives behind the [`MarkerStore`] trait.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

/// Abstract storage for named boolean markers.
///
/// Keys are plain names such as `flowdag_train_fail_once`.
pub trait MarkerStore: Send + Sync {
    fn is_set(&self, key: &str) -> Result<bool>;
    fn set(&self, key: &str) -> Result<()>;
    fn clear(&self, key: &str) -> Result<()>;
}

/// One sentinel file per marker: `<dir>/<key>.marker`.
#[derive(Debug, Clone)]
pub struct FileMarkerStore {
    dir: PathBuf,
}

impl FileMarkerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store markers in the OS temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn marker_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.marker"))
    }
}

impl Default for FileMarkerStore {
    fn default() -> Self {
        Self::in_temp_dir()
    }
}

impl MarkerStore for FileMarkerStore {
    fn is_set(&self, key: &str) -> Result<bool> {
        Ok(self.marker_path(key).exists())
    }

    fn set(&self, key: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating marker directory at {:?}", self.dir))?;
        let path = self.marker_path(key);
        fs::write(&path, "fail once\n")
            .with_context(|| format!("writing marker file at {:?}", path))?;
        debug!(key, path = %path.display(), "marker set (file)");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.marker_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("removing marker file at {:?}", path))?;
            debug!(key, "marker cleared (file)");
        }
        Ok(())
    }
}

/// Keeps markers in memory only (lost on restart).
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    keys: Mutex<HashSet<String>>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn is_set(&self, key: &str) -> Result<bool> {
        let keys = self.keys.lock().map_err(|_| anyhow!("marker store lock poisoned"))?;
        Ok(keys.contains(key))
    }

    fn set(&self, key: &str) -> Result<()> {
        let mut keys = self.keys.lock().map_err(|_| anyhow!("marker store lock poisoned"))?;
        keys.insert(key.to_string());
        debug!(key, "marker set (memory)");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut keys = self.keys.lock().map_err(|_| anyhow!("marker store lock poisoned"))?;
        keys.remove(key);
        Ok(())
    }
}

/// Injected failure: fails the first attempt that ever checks `key`, then
/// never again (until someone clears the marker).
#[derive(Clone)]
pub struct FailOnce {
    store: Arc<dyn MarkerStore>,
    key: String,
}

impl fmt::Debug for FailOnce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailOnce").field("key", &self.key).finish_non_exhaustive()
    }
}

impl FailOnce {
    pub fn new(store: Arc<dyn MarkerStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fail if the marker is not set yet, setting it on the way out.
    pub fn check(&self) -> Result<()> {
        if self.store.is_set(&self.key)? {
            return Ok(());
        }
        self.store.set(&self.key)?;
        info!(key = %self.key, "marker absent; injecting one-time failure");
        bail!("Intentional one-time failure to demonstrate retries.")
    }
}
