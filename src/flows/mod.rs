// src/flows/mod.rs

//! Built-in flows and the context they are assembled from.
//!
//! - [`repro`]: shell out to the pipeline reproduction command, then
//!   optionally summarise the metrics report.
//! - [`stages`]: run prepare -> train -> evaluate in process.
//! - [`file`]: turn a validated flow file into a [`Flow`](crate::flow::Flow).

pub mod file;
pub mod repro;
pub mod stages;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::BackendConfig;
use crate::exec::{LogSink, ProcessRunner, TracingSink};
use crate::task::{FileMarkerStore, MarkerStore};

pub use file::file_flow;
pub use repro::{REPRO_FAIL_ONCE_KEY, ReproOptions, metrics_summary, repro_flow};
pub use stages::{StageOptions, TRAIN_FAIL_ONCE_KEY, stage_flow};

/// Fixed artifact locations under a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_data(&self) -> PathBuf {
        self.root.join("data/raw/iris.csv")
    }

    pub fn train_data(&self) -> PathBuf {
        self.root.join("data/processed/train.csv")
    }

    pub fn test_data(&self) -> PathBuf {
        self.root.join("data/processed/test.csv")
    }

    pub fn model(&self) -> PathBuf {
        self.root.join("models/model.json")
    }

    pub fn metrics(&self) -> PathBuf {
        self.root.join("reports/metrics.json")
    }

    pub fn params(&self) -> PathBuf {
        self.root.join("params.toml")
    }
}

/// Everything a built-in flow needs, passed explicitly to every task.
#[derive(Clone)]
pub struct FlowContext {
    layout: ProjectLayout,
    backend: BackendConfig,
    markers: Arc<dyn MarkerStore>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for FlowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowContext")
            .field("layout", &self.layout)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl FlowContext {
    /// Context rooted at the backend's project root, with markers in the OS
    /// temp dir and process output routed to `tracing`.
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            layout: ProjectLayout::new(backend.project_root()),
            backend,
            markers: Arc::new(FileMarkerStore::default()),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_markers(mut self, markers: Arc<dyn MarkerStore>) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn markers(&self) -> Arc<dyn MarkerStore> {
        Arc::clone(&self.markers)
    }

    /// Process runner carrying the backend environment.
    pub fn runner(&self) -> ProcessRunner {
        ProcessRunner::new(self.backend.env_vars(), Arc::clone(&self.sink))
    }
}
