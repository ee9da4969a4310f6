// src/pipeline/params.rs

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{FlowdagError, Result};

/// Pipeline parameters, read from `params.toml`:
///
/// ```toml
/// [split]
/// test_size = 0.2
/// random_state = 42
///
/// [preprocess]
/// standardize = true
///
/// [train]
/// C = 1.0
/// max_iter = 200
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Params {
    pub split: SplitConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    pub train: TrainConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SplitConfig {
    /// Fraction of each class held out for evaluation, in `[0.05, 0.95]`.
    pub test_size: f64,
    pub random_state: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreprocessConfig {
    #[serde(default = "default_standardize")]
    pub standardize: bool,
}

fn default_standardize() -> bool {
    true
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            standardize: default_standardize(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainConfig {
    /// Inverse regularisation strength, `> 0`.
    #[serde(rename = "C", alias = "c")]
    pub c: f64,
    /// Gradient descent iterations, `>= 10`.
    pub max_iter: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            split: SplitConfig {
                test_size: 0.2,
                random_state: 42,
            },
            preprocess: PreprocessConfig::default(),
            train: TrainConfig {
                c: 1.0,
                max_iter: 200,
            },
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        let test_size = self.split.test_size;
        if !(0.05..=0.95).contains(&test_size) {
            return Err(FlowdagError::ConfigError(format!(
                "split.test_size must be within [0.05, 0.95] (got {test_size})"
            )));
        }
        if !(self.train.c > 0.0) {
            return Err(FlowdagError::ConfigError(format!(
                "train.C must be > 0 (got {})",
                self.train.c
            )));
        }
        if self.train.max_iter < 10 {
            return Err(FlowdagError::ConfigError(format!(
                "train.max_iter must be >= 10 (got {})",
                self.train.max_iter
            )));
        }
        Ok(())
    }
}

/// Parse and validate parameters from TOML text.
pub fn parse_params(text: &str) -> Result<Params> {
    let params: Params = toml::from_str(text)?;
    params.validate()?;
    Ok(params)
}

/// Load and validate parameters from a TOML file.
pub fn load_params(path: &Path) -> Result<Params> {
    if !path.exists() {
        return Err(FlowdagError::ArtifactNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_params(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_example() {
        let params = parse_params(
            r#"
[split]
test_size = 0.25
random_state = 7

[train]
C = 0.5
max_iter = 100
"#,
        )
        .unwrap();

        assert_eq!(params.split.test_size, 0.25);
        assert!(params.preprocess.standardize);
        assert_eq!(params.train.c, 0.5);
    }

    #[test]
    fn out_of_range_values_are_config_errors() {
        let err = parse_params(
            r#"
[split]
test_size = 0.99
random_state = 0
[train]
C = 1.0
max_iter = 100
"#,
        )
        .unwrap_err();
        assert!(matches!(err, FlowdagError::ConfigError(msg) if msg.contains("test_size")));

        let mut params = Params::default();
        params.train.max_iter = 5;
        assert!(params.validate().is_err());
    }
}
