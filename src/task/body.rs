// src/task/body.rs

//! The unit of work a task performs on each attempt.

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use tracing::Span;

use crate::exec::{Command, ProcessRunner};

/// In-process task body. Runs on the blocking thread pool.
pub type NativeFn = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// What a task does when it runs.
///
/// The retry engine treats both variants the same way; it only sees the
/// `Result` of an attempt.
#[derive(Clone)]
pub enum TaskBody {
    /// Spawn an external process through a [`ProcessRunner`].
    Shell(Command),
    /// Call a function in this process.
    Native(NativeFn),
}

impl TaskBody {
    pub fn shell(command: Command) -> Self {
        TaskBody::Shell(command)
    }

    pub fn native<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        TaskBody::Native(Arc::new(f))
    }

    /// Run the body once.
    pub(crate) async fn invoke(&self, runner: &ProcessRunner) -> anyhow::Result<()> {
        match self {
            TaskBody::Shell(command) => runner.run(command).await.map_err(Into::into),
            TaskBody::Native(f) => {
                let f = Arc::clone(f);
                let span = Span::current();
                tokio::task::spawn_blocking(move || {
                    let _entered = span.enter();
                    f()
                })
                .await
                .context("native task body panicked")?
            }
        }
    }
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBody::Shell(command) => f.debug_tuple("Shell").field(command).finish(),
            TaskBody::Native(_) => f.write_str("Native(..)"),
        }
    }
}
