// src/task/mod.rs

//! Named, retryable units of work.
//!
//! - [`policy`] defines `RetryPolicy` (max attempts + delay).
//! - [`body`] defines what a task runs: a shell command or a native closure.
//! - [`marker`] provides durable markers and the `FailOnce` injection used to
//!   exercise the retry path.
//!
//! A [`Task`] moves through `Pending -> Running -> {Succeeded, Retrying,
//! Failed}`; `Retrying` waits for the policy delay and re-enters `Running`.

pub mod body;
pub mod marker;
pub mod policy;

use std::time::Instant;

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::errors::{self, FlowdagError};
use crate::exec::ProcessRunner;

pub use body::{NativeFn, TaskBody};
pub use marker::{FailOnce, FileMarkerStore, MarkerStore, MemoryMarkerStore};
pub use policy::RetryPolicy;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Terminal result of one `Task::execute` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed { reason: String, attempts_used: u32 },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }

    pub fn is_failed(&self) -> bool {
        !self.is_success()
    }
}

/// Lifecycle state of a task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Retrying,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// A named unit of work with a retry policy.
///
/// Built fresh for every run:
///
/// ```no_run
/// # use std::time::Duration;
/// # use flowdag::task::{RetryPolicy, Task, TaskBody};
/// let task = Task::new("train")
///     .with_retry(RetryPolicy::with_retries(1, Duration::from_secs(2)))
///     .with_body(TaskBody::native(|| Ok(())));
/// ```
#[derive(Debug)]
pub struct Task {
    name: TaskName,
    description: Option<String>,
    policy: RetryPolicy,
    body: Option<TaskBody>,
    fail_once: Option<FailOnce>,
    runner: ProcessRunner,
    enabled: bool,
    state: TaskState,
    attempts: u32,
}

impl Task {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            description: None,
            policy: RetryPolicy::default(),
            body: None,
            fail_once: None,
            runner: ProcessRunner::default(),
            enabled: true,
            state: TaskState::Pending,
            attempts: 0,
        }
    }

    /// Human readable text for the `Running: ...` line. Defaults to the name.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_body(mut self, body: TaskBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Runner used by `TaskBody::Shell` bodies.
    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Fail the first attempt ever made under this marker.
    pub fn with_fail_once(mut self, fail_once: FailOnce) -> Self {
        self.fail_once = Some(fail_once);
        self
    }

    /// Disabled tasks are skipped by the flow without being started.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn body(&self) -> Option<&TaskBody> {
        self.body.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Attempts made by the last `execute` call.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run the body until it succeeds, fails with a non-retryable error, or
    /// the retry policy is exhausted.
    pub async fn execute(&mut self) -> TaskOutcome {
        let span = info_span!("task", task = %self.name);
        self.execute_inner().instrument(span).await
    }

    async fn execute_inner(&mut self) -> TaskOutcome {
        let started = Instant::now();
        let max_attempts = self.policy.max_attempts();
        self.attempts = 0;

        info!("Running: {}", self.description());

        let outcome = loop {
            self.attempts += 1;
            self.transition(TaskState::Running);

            let err = match self.attempt().await {
                Ok(()) => break TaskOutcome::Success,
                Err(err) => err,
            };

            warn!(
                attempt = self.attempts,
                max_attempts,
                error = %format!("{err:#}"),
                "task attempt failed"
            );

            if !errors::is_retryable(&err) {
                break TaskOutcome::Failed {
                    reason: format!("{err:#}"),
                    attempts_used: self.attempts,
                };
            }

            if self.attempts >= max_attempts {
                let exhausted = FlowdagError::RetryExhausted {
                    attempts: self.attempts,
                    source: err.into(),
                };
                break TaskOutcome::Failed {
                    reason: exhausted.to_string(),
                    attempts_used: self.attempts,
                };
            }

            self.transition(TaskState::Retrying);
            let delay = self.policy.delay();
            info!(
                delay_ms = delay.as_millis() as u64,
                next_attempt = self.attempts + 1,
                "retrying task after delay"
            );
            tokio::time::sleep(delay).await;
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            TaskOutcome::Success => {
                self.transition(TaskState::Succeeded);
                info!(attempts = self.attempts, elapsed_ms, "task succeeded");
            }
            TaskOutcome::Failed { reason, .. } => {
                self.transition(TaskState::Failed);
                error!(attempts = self.attempts, elapsed_ms, reason = %reason, "task failed");
            }
        }

        outcome
    }

    async fn attempt(&self) -> anyhow::Result<()> {
        if let Some(fail_once) = &self.fail_once {
            fail_once.check()?;
        }

        match &self.body {
            Some(body) => body.invoke(&self.runner).await,
            None => Ok(()),
        }
    }

    fn transition(&mut self, next: TaskState) {
        debug!(from = ?self.state, to = ?next, attempt = self.attempts, "task state change");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn counting_body(fail_first: u32) -> (TaskBody, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let body = TaskBody::native(move || {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= fail_first {
                anyhow::bail!("attempt {n} failed");
            }
            Ok(())
        });
        (body, calls)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures_within_budget() {
        let (body, calls) = counting_body(2);
        let mut task = Task::new("flaky")
            .with_retry(RetryPolicy::new(3, Duration::ZERO).unwrap())
            .with_body(body);

        assert_eq!(task.state(), TaskState::Pending);
        let outcome = task.execute().await;

        assert_eq!(outcome, TaskOutcome::Success);
        assert_eq!(task.attempts(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(task.state(), TaskState::Succeeded);
    }

    #[tokio::test]
    async fn exhausted_retries_wrap_last_error() {
        let (body, _) = counting_body(u32::MAX);
        let mut task = Task::new("broken")
            .with_retry(RetryPolicy::new(2, Duration::ZERO).unwrap())
            .with_body(body);

        match task.execute().await {
            TaskOutcome::Failed {
                reason,
                attempts_used,
            } => {
                assert_eq!(attempts_used, 2);
                assert!(reason.contains("Retries exhausted after 2"));
                assert!(reason.contains("attempt 2 failed"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(task.state().is_terminal());
    }

    #[tokio::test]
    async fn task_without_body_succeeds() {
        let mut task = Task::new("noop");
        assert_eq!(task.execute().await, TaskOutcome::Success);
        assert_eq!(task.attempts(), 1);
        assert_eq!(task.description(), "noop");
    }
}
