#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use flowdag::config::{FlowFile, FlowSection, RawFlowFile, TaskConfig};
use flowdag::task::TaskBody;

/// Builder for `RawFlowFile` / `FlowFile` to simplify test setup.
pub struct FlowFileBuilder {
    raw: RawFlowFile,
}

impl FlowFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            raw: RawFlowFile {
                flow: FlowSection {
                    name: name.to_string(),
                },
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.raw.task.insert(name.to_string(), task);
        self
    }

    pub fn raw(self) -> RawFlowFile {
        self.raw
    }

    pub fn build(self) -> FlowFile {
        FlowFile::try_from(self.raw).expect("Failed to build valid flow file from builder")
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                description: None,
                cwd: None,
                after: vec![],
                retries: 0,
                retry_delay: None,
                enabled: true,
                fail_once: false,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn retries(mut self, retries: u32, delay: &str) -> Self {
        self.task.retries = retries;
        self.task.retry_delay = Some(delay.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.task.enabled = false;
        self
    }

    pub fn fail_once(mut self) -> Self {
        self.task.fail_once = true;
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// A native body that fails its first `fail_first` calls, then succeeds.
/// The returned counter reports how many times the body ran.
pub fn flaky_body(fail_first: u32) -> (TaskBody, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let body = TaskBody::native(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= fail_first {
            anyhow::bail!("transient failure {n}");
        }
        Ok(())
    });
    (body, calls)
}

/// A native body that always fails.
pub fn failing_body() -> (TaskBody, Arc<AtomicU32>) {
    flaky_body(u32::MAX)
}

/// A native body that always succeeds.
pub fn ok_body() -> (TaskBody, Arc<AtomicU32>) {
    flaky_body(0)
}
