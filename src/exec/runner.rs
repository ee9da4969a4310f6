// src/exec/runner.rs

//! External process runner with live output streaming.

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command as ProcessCommand;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::{FlowdagError, Result};
use crate::exec::command::Command;
use crate::exec::sink::{LogSink, TracingSink};

/// Runs [`Command`]s to completion, forwarding their combined stdout/stderr
/// to a [`LogSink`] line by line while they run.
///
/// `env` holds the variables handed over by the backend configuration; they
/// are added on top of the inherited environment of this process for each
/// child only.
#[derive(Clone)]
pub struct ProcessRunner {
    env: Vec<(String, String)>,
    sink: Arc<dyn LogSink>,
}

impl fmt::Debug for ProcessRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("ProcessRunner")
            .field("env", &keys)
            .finish_non_exhaustive()
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Vec::new(), Arc::new(TracingSink))
    }
}

impl ProcessRunner {
    pub fn new(env: Vec<(String, String)>, sink: Arc<dyn LogSink>) -> Self {
        Self { env, sink }
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Run `command` and wait for it to exit.
    ///
    /// Returns [`FlowdagError::Execution`] when the process exits with a
    /// non-zero status (`-1` if it was terminated by a signal). There is no
    /// timeout: a command that never exits blocks the caller forever.
    pub async fn run(&self, command: &Command) -> Result<()> {
        info!("Running: {command}");
        info!("CWD: {}", command.cwd().display());

        let mut cmd = ProcessCommand::new(command.program());
        cmd.args(command.args())
            .current_dir(command.cwd())
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process `{command}`"))?;

        // Both pipes feed one channel. Each stream's lines stay in order; the
        // interleaving across stdout and stderr is only approximate.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, line_tx.clone()));
        }
        drop(line_tx);

        while let Some(line) = line_rx.recv().await {
            self.sink.line(&line);
        }

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for process `{command}`"))?;

        if status.success() {
            debug!(cmd = %command, "process exited successfully");
            return Ok(());
        }

        let exit_code = status.code().unwrap_or(-1);
        error!(cmd = %command, exit_code, "process exited with failure");
        Err(FlowdagError::Execution {
            exit_code,
            command: command.to_string(),
        })
    }
}

/// Read `reader` line by line and push every non-empty line into `tx`.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the stream.
/// After a read error the pipe is still drained so the child never sees a
/// closed pipe.
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                let line = text.trim_end_matches(['\n', '\r']);
                if line.is_empty() {
                    continue;
                }
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "failed reading process output; discarding the rest");
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    debug!(error = %e, "stopped draining process output");
                }
                break;
            }
        }
    }
}
