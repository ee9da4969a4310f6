// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] holds the immutable argv + working directory description.
//! - [`runner`] spawns the process with `tokio::process::Command`, streams
//!   its merged stdout/stderr and maps a non-zero exit to an error.
//! - [`sink`] provides the `LogSink` trait that receives output lines, with
//!   `TracingSink` as the production implementation.

pub mod command;
pub mod runner;
pub mod sink;

pub use command::Command;
pub use runner::ProcessRunner;
pub use sink::{LogSink, TracingSink};
