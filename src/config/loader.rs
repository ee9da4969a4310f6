// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{FlowFile, RawFlowFile};
use crate::errors::{FlowdagError, Result};

/// File name looked up in the project root when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Flowdag.toml";

/// Load a flow file from a given path and return the raw `RawFlowFile`.
///
/// This only performs TOML deserialization; it does **not** check
/// dependencies or cycles. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawFlowFile> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(FlowdagError::ConfigError(format!(
            "flow file not found: {}",
            path.display()
        )));
    }
    let contents = fs::read_to_string(path)?;

    let raw: RawFlowFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a flow file and validate it (unknown or self dependencies, cycles,
/// durations).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<FlowFile> {
    let raw = load_from_path(&path)?;
    FlowFile::try_from(raw)
}

/// Default flow file location for a project root.
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(DEFAULT_CONFIG_FILE)
}
