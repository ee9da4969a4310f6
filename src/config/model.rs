// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::task::RetryPolicy;

/// Flow file as read from TOML, before validation.
///
/// ```toml
/// [flow]
/// name = "nightly"
///
/// [task.fetch]
/// cmd = "./scripts/fetch.sh"
/// retries = 2
/// retry_delay = "5s"
///
/// [task.report]
/// cmd = "make report"
/// after = ["fetch"]
/// ```
///
/// Turn it into a [`FlowFile`] with `FlowFile::try_from(raw)`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFlowFile {
    #[serde(default)]
    pub flow: FlowSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[flow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowSection {
    #[serde(default = "default_flow_name")]
    pub name: String,
}

fn default_flow_name() -> String {
    "flowfile".to_string()
}

impl Default for FlowSection {
    fn default() -> Self {
        Self {
            name: default_flow_name(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Shell command line, run with `sh -c` (`cmd /C` on Windows).
    pub cmd: String,

    /// Text for the `Running: ...` log line; defaults to the task name.
    #[serde(default)]
    pub description: Option<String>,

    /// Working directory relative to the project root.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Tasks that must run before this one.
    #[serde(default)]
    pub after: Vec<String>,

    /// Extra attempts after the first failure.
    #[serde(default)]
    pub retries: u32,

    /// Wait between attempts, e.g. `"2s"` or `"500ms"`.
    #[serde(default)]
    pub retry_delay: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Fail the very first attempt ever made, to exercise the retry path.
    #[serde(default)]
    pub fail_once: bool,
}

fn default_enabled() -> bool {
    true
}

/// One validated task of a flow file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTask {
    pub name: String,
    pub cmd: String,
    pub description: Option<String>,
    pub cwd: Option<PathBuf>,
    pub after: Vec<String>,
    pub policy: RetryPolicy,
    pub enabled: bool,
    pub fail_once: bool,
}

/// A validated flow file: acyclic, every dependency known, tasks listed in
/// an order where each task comes after all of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFile {
    pub name: String,
    pub tasks: Vec<FlowTask>,
}

impl FlowFile {
    /// Build without checking invariants. Used after validation.
    pub(crate) fn new_unchecked(name: String, tasks: Vec<FlowTask>) -> Self {
        Self { name, tasks }
    }

    pub fn task(&self, name: &str) -> Option<&FlowTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }
}
