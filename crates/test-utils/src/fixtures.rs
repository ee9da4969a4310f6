//! On-disk project fixtures for pipeline tests.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use flowdag::flows::ProjectLayout;
use flowdag::pipeline::data::{FEATURE_COLUMNS, LABEL_COLUMN};

pub const DEFAULT_PARAMS: &str = r#"[split]
test_size = 0.2
random_state = 42

[preprocess]
standardize = true

[train]
C = 1.0
max_iter = 200
"#;

/// Class centres loosely modelled on the three iris species.
const CENTRES: [(&str, [f64; 4]); 3] = [
    ("0", [5.0, 3.4, 1.5, 0.25]),
    ("1", [5.9, 2.8, 4.3, 1.3]),
    ("2", [6.6, 3.0, 5.6, 2.0]),
];

/// Deterministic three-class dataset with `per_class` rows per class.
pub fn synthetic_iris_csv(per_class: usize) -> String {
    let mut out = format!("{},{}\n", FEATURE_COLUMNS.join(","), LABEL_COLUMN);
    for (label, centre) in CENTRES {
        for i in 0..per_class {
            let row: Vec<String> = centre
                .iter()
                .enumerate()
                .map(|(j, c)| {
                    let jitter = (((i * 37 + j * 11) % 11) as f64 - 5.0) * 0.03;
                    format!("{:.2}", c + jitter)
                })
                .collect();
            writeln!(out, "{},{}", row.join(","), label).unwrap();
        }
    }
    out
}

/// Write `params.toml` and the raw dataset under `root`.
pub fn write_project(root: &Path, params: &str, per_class: usize) -> ProjectLayout {
    let layout = ProjectLayout::new(root);
    fs::create_dir_all(layout.raw_data().parent().unwrap()).unwrap();
    fs::write(layout.raw_data(), synthetic_iris_csv(per_class)).unwrap();
    fs::write(layout.params(), params).unwrap();
    layout
}

/// Write a metrics report with the given values.
pub fn write_metrics_report(layout: &ProjectLayout, json: &str) {
    let path = layout.metrics();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, json).unwrap();
}
