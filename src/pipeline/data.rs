// src/pipeline/data.rs

//! Tabular data loading and storing.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::errors::FlowdagError;

pub const FEATURE_COLUMNS: [&str; 4] = [
    "sepal length (cm)",
    "sepal width (cm)",
    "petal length (cm)",
    "petal width (cm)",
];
pub const LABEL_COLUMN: &str = "label";

/// Feature rows plus one label per row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sorted distinct labels.
    pub fn classes(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.labels.iter().collect();
        set.into_iter().cloned().collect()
    }

    /// Rows at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

/// Load a CSV with a header containing [`FEATURE_COLUMNS`] and
/// [`LABEL_COLUMN`]; other columns are ignored.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(FlowdagError::ArtifactNotFound(path.to_path_buf()).into());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading CSV {:?}", path))?;
    parse_csv(&text).with_context(|| format!("parsing CSV {:?}", path))
}

fn parse_csv(text: &str) -> Result<Dataset> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header: Vec<&str> = match lines.next() {
        Some(h) => h.split(',').map(str::trim).collect(),
        None => bail!("CSV is empty"),
    };

    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| *h == name)
            .with_context(|| format!("missing column '{name}'"))
    };
    let feature_idx = FEATURE_COLUMNS
        .iter()
        .map(|c| column(*c))
        .collect::<Result<Vec<_>>>()?;
    let label_idx = column(LABEL_COLUMN)?;

    let mut dataset = Dataset::default();
    for (row_no, line) in lines.enumerate() {
        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        if cells.len() != header.len() {
            bail!(
                "row {} has {} cells, expected {}",
                row_no + 1,
                cells.len(),
                header.len()
            );
        }

        let row = feature_idx
            .iter()
            .map(|&i| {
                cells[i].parse::<f64>().with_context(|| {
                    format!("row {}: invalid number '{}' in '{}'", row_no + 1, cells[i], header[i])
                })
            })
            .collect::<Result<Vec<_>>>()?;

        dataset.features.push(row);
        dataset.labels.push(cells[label_idx].to_string());
    }

    Ok(dataset)
}

/// Write `dataset` with the canonical header, creating parent directories.
pub fn save_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }

    let mut out = String::new();
    out.push_str(&FEATURE_COLUMNS.join(","));
    out.push(',');
    out.push_str(LABEL_COLUMN);
    out.push('\n');

    for (row, label) in dataset.features.iter().zip(&dataset.labels) {
        for value in row {
            write!(out, "{value},")?;
        }
        out.push_str(label);
        out.push('\n');
    }

    fs::write(path, out).with_context(|| format!("writing CSV {:?}", path))?;
    Ok(())
}
