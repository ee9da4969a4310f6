// src/pipeline/model.rs

//! Multinomial logistic regression with optional standardisation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::errors::FlowdagError;
use crate::pipeline::data::Dataset;

/// Per-feature mean / standard deviation scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let n = rows.len().max(1) as f64;

        let mut mean = vec![0.0; n_features];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut scale = vec![0.0; n_features];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (v - m).powi(2) / n;
            }
        }
        // Constant features keep their values centred but unscaled.
        for s in scale.iter_mut() {
            *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
        }

        Self { mean, scale }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((v, m), s)| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// Softmax regression: one weight vector and intercept per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticRegression {
    /// Fit by full-batch gradient descent on the L2-penalised mean
    /// cross-entropy, `loss + |W|^2 / (2 * c * n)`.
    pub fn fit(rows: &[Vec<f64>], labels: &[String], c: f64, max_iter: u32) -> Result<Self> {
        ensure!(!rows.is_empty(), "cannot fit a model on an empty dataset");
        ensure!(rows.len() == labels.len(), "features and labels differ in length");
        ensure!(c > 0.0, "C must be > 0");

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            bail!("need at least two classes to fit, got {}", classes.len());
        }

        let n = rows.len() as f64;
        let n_features = rows[0].len();
        let k = classes.len();
        let targets: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or(0))
            .collect();

        // Step size from a bound on the loss curvature.
        let max_norm = rows
            .iter()
            .map(|r| r.iter().map(|v| v * v).sum::<f64>() + 1.0)
            .fold(0.0_f64, f64::max);
        let lipschitz = 0.5 * max_norm + 1.0 / (c * n);
        let lr = 1.0 / lipschitz;

        let mut model = Self {
            classes,
            weights: vec![vec![0.0; n_features]; k],
            intercepts: vec![0.0; k],
        };

        for _ in 0..max_iter {
            let mut grad_w = vec![vec![0.0; n_features]; k];
            let mut grad_b = vec![0.0; k];

            for (row, &target) in rows.iter().zip(&targets) {
                let probs = model.probabilities(row);
                for (class, p) in probs.iter().enumerate() {
                    let err = p - if class == target { 1.0 } else { 0.0 };
                    grad_b[class] += err / n;
                    for (g, x) in grad_w[class].iter_mut().zip(row) {
                        *g += err * x / n;
                    }
                }
            }

            for class in 0..k {
                for (w, g) in model.weights[class].iter_mut().zip(&grad_w[class]) {
                    *w -= lr * (g + *w / (c * n));
                }
                model.intercepts[class] -= lr * grad_b[class];
            }
        }

        Ok(model)
    }

    /// Class probabilities for one row, in `classes` order.
    pub fn probabilities(&self, row: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }

    pub fn predict_row(&self, row: &[f64]) -> &str {
        let probs = self.probabilities(row);
        let best = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        &self.classes[best]
    }
}

/// Everything `evaluate` needs to reproduce training-time preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitArtifacts {
    pub model: LogisticRegression,
    pub scaler: Option<StandardScaler>,
}

pub fn fit_logreg(data: &Dataset, c: f64, max_iter: u32, standardize: bool) -> Result<FitArtifacts> {
    let scaler = standardize.then(|| StandardScaler::fit(&data.features));
    let rows = match &scaler {
        Some(s) => s.transform(&data.features),
        None => data.features.clone(),
    };
    let model = LogisticRegression::fit(&rows, &data.labels, c, max_iter)?;
    Ok(FitArtifacts { model, scaler })
}

pub fn predict(artifacts: &FitArtifacts, rows: &[Vec<f64>], standardize: bool) -> Vec<String> {
    rows.iter()
        .map(|row| match (&artifacts.scaler, standardize) {
            (Some(scaler), true) => artifacts.model.predict_row(&scaler.transform_row(row)),
            _ => artifacts.model.predict_row(row),
        })
        .map(str::to_string)
        .collect()
}

pub fn save_artifacts(artifacts: &FitArtifacts, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(artifacts)?;
    fs::write(path, json + "\n").with_context(|| format!("writing model {:?}", path))?;
    Ok(())
}

pub fn load_artifacts(path: &Path) -> Result<FitArtifacts> {
    if !path.exists() {
        return Err(FlowdagError::ArtifactNotFound(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading model {:?}", path))?;
    serde_json::from_str(&text).with_context(|| format!("parsing model {:?}", path))
}
