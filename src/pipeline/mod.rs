// src/pipeline/mod.rs

//! Toy classification pipeline: prepare, train, evaluate.

pub mod data;
pub mod metrics;
pub mod model;
pub mod params;
pub mod stages;

pub use data::Dataset;
pub use metrics::{Metrics, compute_metrics, read_metrics, read_metrics_value, write_metrics};
pub use params::{Params, load_params, parse_params};
pub use stages::{artifact_digest, evaluate, prepare, stratified_split, train};
