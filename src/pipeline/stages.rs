// src/pipeline/stages.rs

//! The three pipeline stages driven by the built-in "stages" flow.
//!
//! Each stage is a plain synchronous function reading its inputs from disk
//! and writing its outputs back. Stages do not check whether their inputs
//! are up to date; instead every written artifact is logged with its blake3
//! digest so a stale input can be spotted in the logs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use blake3::Hasher;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::pipeline::data::{Dataset, load_csv, save_csv};
use crate::pipeline::metrics::{Metrics, compute_metrics, write_metrics};
use crate::pipeline::model::{fit_logreg, load_artifacts, predict, save_artifacts};
use crate::pipeline::params::Params;

/// Hex blake3 digest of a file's contents.
pub fn artifact_digest(path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file =
        File::open(path).with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

fn log_artifact(stage: &str, path: &Path) -> Result<()> {
    let digest = artifact_digest(path)?;
    info!(stage, path = %path.display(), %digest, "artifact written");
    Ok(())
}

/// Split `data` into `(train, test)` keeping class proportions.
///
/// Every class with at least two rows contributes at least one row to each
/// side. The result is fully determined by `test_size` and `seed`.
pub fn stratified_split(data: &Dataset, test_size: f64, seed: u64) -> (Dataset, Dataset) {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in data.labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(i);
    }

    let mut train_idx = Vec::new();
    let mut test_idx = Vec::new();
    for (_, mut rows) in by_class {
        rows.shuffle(&mut rng);
        let len = rows.len();
        let n_test = if len < 2 {
            0
        } else {
            ((len as f64 * test_size).round() as usize).clamp(1, len - 1)
        };
        test_idx.extend_from_slice(&rows[..n_test]);
        train_idx.extend_from_slice(&rows[n_test..]);
    }

    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);
    (data.subset(&train_idx), data.subset(&test_idx))
}

/// Load the raw CSV, split it and write the train/test CSVs.
pub fn prepare(raw: &Path, train_out: &Path, test_out: &Path, params: &Params) -> Result<()> {
    let data = load_csv(raw)?;
    ensure!(!data.is_empty(), "raw dataset {:?} has no rows", raw);

    let (train, test) = stratified_split(&data, params.split.test_size, params.split.random_state);
    save_csv(&train, train_out)?;
    save_csv(&test, test_out)?;

    info!(rows = data.len(), train = train.len(), test = test.len(), "prepared dataset");
    log_artifact("prepare", train_out)?;
    log_artifact("prepare", test_out)?;
    Ok(())
}

/// Fit the model on the train CSV and store it as JSON.
pub fn train(train_in: &Path, model_out: &Path, params: &Params) -> Result<()> {
    let data = load_csv(train_in)?;
    let artifacts = fit_logreg(
        &data,
        params.train.c,
        params.train.max_iter,
        params.preprocess.standardize,
    )
    .context("fitting logistic regression")?;
    save_artifacts(&artifacts, model_out)?;

    info!(
        rows = data.len(),
        classes = artifacts.model.classes.len(),
        "trained model"
    );
    log_artifact("train", model_out)?;
    Ok(())
}

/// Score the stored model on the test CSV and write the metrics report.
pub fn evaluate(
    test_in: &Path,
    model_in: &Path,
    metrics_out: &Path,
    params: &Params,
) -> Result<Metrics> {
    let data = load_csv(test_in)?;
    let artifacts = load_artifacts(model_in)?;

    let predicted = predict(&artifacts, &data.features, params.preprocess.standardize);
    let metrics = compute_metrics(&data.labels, &predicted);
    write_metrics(&metrics, metrics_out)?;

    info!(
        accuracy = metrics.accuracy,
        f1_macro = metrics.f1_macro,
        "evaluated model"
    );
    log_artifact("evaluate", metrics_out)?;
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled(counts: &[(&str, usize)]) -> Dataset {
        let mut ds = Dataset::default();
        for (label, n) in counts {
            for i in 0..*n {
                ds.features.push(vec![i as f64]);
                ds.labels.push(label.to_string());
            }
        }
        ds
    }

    fn count(ds: &Dataset, label: &str) -> usize {
        ds.labels.iter().filter(|l| *l == label).count()
    }

    #[test]
    fn split_is_stratified() {
        let ds = labelled(&[("a", 50), ("b", 50), ("c", 50)]);
        let (train, test) = stratified_split(&ds, 0.2, 42);

        assert_eq!(train.len() + test.len(), 150);
        for label in ["a", "b", "c"] {
            assert_eq!(count(&test, label), 10);
            assert_eq!(count(&train, label), 40);
        }
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let ds = labelled(&[("a", 20), ("b", 13)]);
        assert_eq!(stratified_split(&ds, 0.3, 7), stratified_split(&ds, 0.3, 7));
    }

    #[test]
    fn small_classes_still_reach_both_sides() {
        let ds = labelled(&[("a", 2), ("b", 1)]);
        let (train, test) = stratified_split(&ds, 0.05, 0);
        assert_eq!(count(&test, "a"), 1);
        assert_eq!(count(&train, "a"), 1);
        assert_eq!(count(&train, "b"), 1);
    }

    #[test]
    fn digest_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "one").unwrap();
        let first = artifact_digest(&path).unwrap();
        std::fs::write(&path, "two").unwrap();
        assert_ne!(first, artifact_digest(&path).unwrap());
        assert_eq!(first.len(), 64);
    }
}
