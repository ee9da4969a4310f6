// src/config/mod.rs

//! Declarative flow files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a flow file from disk (`loader.rs`).
//! - Validate dependencies and derive the execution order (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_from_path};
pub use model::{FlowFile, FlowSection, FlowTask, RawFlowFile, TaskConfig};
pub use validate::{execution_order, parse_duration};
