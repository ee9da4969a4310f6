// src/flow/mod.rs

//! Ordered composition of tasks with fail-fast propagation.
//!
//! A [`Flow`] is a linear chain: task N+1 starts only after task N reached a
//! terminal state, and the first failed task stops the flow. Disabled tasks
//! are skipped without being started or recorded.

use std::time::Instant;

use tracing::{Instrument, info, info_span, warn};

use crate::task::{Task, TaskName, TaskOutcome};

/// Aggregate status of a flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Success,
    Failed,
}

/// Write-once record of a flow run.
///
/// `outcomes` lists every task that started, in execution order. It is a list
/// rather than a single value so a task that fans out later can still report
/// through the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResult {
    name: String,
    outcomes: Vec<(TaskName, TaskOutcome)>,
    status: FlowStatus,
}

impl FlowResult {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outcomes(&self) -> &[(TaskName, TaskOutcome)] {
        &self.outcomes
    }

    pub fn status(&self) -> FlowStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == FlowStatus::Success
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcome_of(&self, task: &str) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, outcome)| outcome)
    }

    /// Name of the task that stopped the flow, if any.
    pub fn failed_task(&self) -> Option<&str> {
        self.outcomes
            .iter()
            .find(|(_, outcome)| outcome.is_failed())
            .map(|(name, _)| name.as_str())
    }
}

/// An ordered list of tasks executed one after another.
#[derive(Debug)]
pub struct Flow {
    name: String,
    tasks: Vec<Task>,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Append a task; it runs after every task added before it.
    pub fn add(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(Task::name)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every enabled task in order, stopping at the first failure.
    pub async fn execute(self) -> FlowResult {
        let span = info_span!("flow", flow = %self.name);
        self.execute_inner().instrument(span).await
    }

    async fn execute_inner(self) -> FlowResult {
        let started = Instant::now();
        let total = self.tasks.len();
        info!(tasks = total, "flow started");

        let mut outcomes = Vec::with_capacity(total);
        let mut status = FlowStatus::Success;
        let mut tasks = self.tasks.into_iter();

        while let Some(mut task) = tasks.next() {
            if !task.is_enabled() {
                info!(task = %task.name(), "task disabled; skipping");
                continue;
            }

            let outcome = task.execute().await;
            let failed = outcome.is_failed();
            outcomes.push((task.name().to_string(), outcome));

            if failed {
                status = FlowStatus::Failed;
                let skipped: Vec<TaskName> =
                    tasks.by_ref().map(|t| t.name().to_string()).collect();
                warn!(
                    task = %task.name(),
                    ?skipped,
                    "task failed; downstream tasks will not run"
                );
                break;
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match status {
            FlowStatus::Success => info!(ran = outcomes.len(), elapsed_ms, "flow succeeded"),
            FlowStatus::Failed => warn!(ran = outcomes.len(), elapsed_ms, "flow failed"),
        }

        FlowResult {
            name: self.name,
            outcomes,
            status,
        }
    }
}
