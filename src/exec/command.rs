// src/exec/command.rs

//! Immutable description of an external process invocation.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{FlowdagError, Result};

/// An argument vector plus the working directory to run it in.
///
/// The first element of `argv` is the program; it is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
    cwd: PathBuf,
}

impl Command {
    pub fn new<I, S>(argv: I, cwd: impl Into<PathBuf>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(FlowdagError::ConfigError(
                "command must contain at least the program name".to_string(),
            ));
        }

        Ok(Self {
            argv,
            cwd: cwd.into(),
        })
    }

    /// Wrap a shell snippet in the platform shell (`sh -c` / `cmd /C`).
    pub fn shell(script: &str, cwd: impl Into<PathBuf>) -> Result<Self> {
        if cfg!(windows) {
            Self::new(["cmd", "/C", script], cwd)
        } else {
            Self::new(["sh", "-c", script], cwd)
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}
