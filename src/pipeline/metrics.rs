// src/pipeline/metrics.rs

//! Classification metrics and the persisted metrics report.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{FlowdagError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub f1_macro: f64,
}

/// Accuracy and unweighted mean of per-class F1 over every label seen in
/// either `y_true` or `y_pred`.
pub fn compute_metrics(y_true: &[String], y_pred: &[String]) -> Metrics {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return Metrics {
            accuracy: 0.0,
            f1_macro: 0.0,
        };
    }

    let pairs = || y_true.iter().zip(y_pred.iter());
    let correct = pairs().filter(|(t, p)| t == p).count();

    let labels: BTreeSet<&String> = y_true.iter().chain(y_pred.iter()).collect();
    let f1_sum: f64 = labels
        .iter()
        .map(|&label| {
            let tp = pairs().filter(|(t, p)| *t == label && *p == label).count();
            let fp = pairs().filter(|(t, p)| *t != label && *p == label).count();
            let fn_ = pairs().filter(|(t, p)| *t == label && *p != label).count();
            let denom = 2 * tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                (2 * tp) as f64 / denom as f64
            }
        })
        .sum();

    Metrics {
        accuracy: correct as f64 / n as f64,
        f1_macro: f1_sum / labels.len() as f64,
    }
}

/// Render metrics as pretty JSON with sorted keys and a trailing newline.
pub fn render_metrics(metrics: &Metrics) -> Result<String> {
    // `serde_json::Value` objects are ordered maps, so keys come out sorted.
    let value = serde_json::to_value(metrics)?;
    Ok(serde_json::to_string_pretty(&value)? + "\n")
}

pub fn write_metrics(metrics: &Metrics, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_metrics(metrics)?)?;
    Ok(())
}

/// Read a metrics report; a missing file is [`FlowdagError::ArtifactNotFound`].
pub fn read_metrics_value(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        return Err(FlowdagError::ArtifactNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn read_metrics(path: &Path) -> Result<Metrics> {
    Ok(serde_json::from_value(read_metrics_value(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn perfect_predictions_score_one() {
        let y = labels(&["a", "b", "c"]);
        let m = compute_metrics(&y, &y);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.f1_macro, 1.0);
    }

    #[test]
    fn macro_f1_averages_per_class_scores() {
        let y_true = labels(&["a", "a", "b", "b"]);
        let y_pred = labels(&["a", "b", "b", "b"]);
        let m = compute_metrics(&y_true, &y_pred);

        assert_eq!(m.accuracy, 0.75);
        // a: tp=1 fp=0 fn=1 -> 2/3; b: tp=2 fp=1 fn=0 -> 4/5
        assert!((m.f1_macro - (2.0 / 3.0 + 0.8) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn rendered_report_has_sorted_keys() {
        let text = render_metrics(&Metrics {
            accuracy: 0.5,
            f1_macro: 0.25,
        })
        .unwrap();
        let acc = text.find("\"accuracy\"").unwrap();
        let f1 = text.find("\"f1_macro\"").unwrap();
        assert!(acc < f1);
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn missing_report_is_artifact_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_metrics(&dir.path().join("metrics.json")).unwrap_err();
        assert!(matches!(err, FlowdagError::ArtifactNotFound(_)));
    }
}
