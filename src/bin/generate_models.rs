//! Writes a pair of demo model artifacts (`logistic_regression.json`,
//! `xgboost.json`) so the dashboard can run without the training pipeline.
//!
//! Usage: `cargo run --bin generate_models [OUTPUT_DIR]`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

const CLASSES: [&str; 4] = ["Good", "Moderate", "Poor", "Hazardous"];

// Must list `Feature::key` in `Feature::ALL` order; checked by the
// tests in `src/data/features.rs`.
const FEATURE_NAMES: [&str; 9] = [
    "temperature",
    "humidity",
    "pm25",
    "pm10",
    "no2",
    "so2",
    "co",
    "industrial_proximity",
    "population_density",
];

const PM25: usize = 2;
const PM10: usize = 3;
const NO2: usize = 4;
const SO2: usize = 5;
const CO: usize = 6;
const PROXIMITY: usize = 7;

/// Pollution index weights shared by every logistic row.
fn index_weights() -> [f64; 9] {
    let mut w = [0.0; 9];
    w[PM25] = 0.04;
    w[PM10] = 0.02;
    w[NO2] = 0.02;
    w[SO2] = 0.02;
    w[CO] = 0.5;
    w[PROXIMITY] = -0.05;
    w
}

/// Class k scores `k * index + b_k`, so the winning class climbs with the
/// index and switches at 1.5, 2.5 and 3.5.
fn logistic_regression() -> Value {
    let w = index_weights();
    let coefficients: Vec<Vec<f64>> = (0..CLASSES.len())
        .map(|k| w.iter().map(|wi| wi * k as f64).collect())
        .collect();
    json!({
        "kind": "logistic_regression",
        "classes": CLASSES,
        "coefficients": coefficients,
        "intercepts": [0.0, -1.5, -4.0, -7.5],
        "feature_names": FEATURE_NAMES,
    })
}

fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Value {
    json!({ "nodes": [
        { "feature": feature, "threshold": threshold, "left": 1, "right": 2, "default_left": true },
        { "value": left },
        { "value": right },
    ]})
}

/// Depth-two tree: split on `a`, then on `b` in both branches.
fn depth_two(a: (usize, f64), b: (usize, f64), leaves: [f64; 4]) -> Value {
    json!({ "nodes": [
        { "feature": a.0, "threshold": a.1, "left": 1, "right": 2, "default_left": true },
        { "feature": b.0, "threshold": b.1, "left": 3, "right": 4, "default_left": true },
        { "feature": b.0, "threshold": b.1, "left": 5, "right": 6, "default_left": true },
        { "value": leaves[0] },
        { "value": leaves[1] },
        { "value": leaves[2] },
        { "value": leaves[3] },
    ]})
}

/// Two boosting rounds of four trees each (one per class).
fn xgboost() -> Value {
    let trees = vec![
        // round 1: PM2.5 bands (WHO-style breakpoints)
        stump(PM25, 12.0, 1.2, -0.8),
        depth_two((PM25, 12.0), (PM25, 35.5), [-0.6, 1.0, -0.2, -0.8]),
        depth_two((PM25, 35.5), (PM25, 55.5), [-0.8, -0.8, 1.0, -0.2]),
        stump(PM25, 55.5, -1.0, 1.2),
        // round 2: gases and coarse particles
        depth_two((NO2, 53.0), (CO, 4.5), [0.4, -0.2, -0.3, 0.0]),
        depth_two((PM10, 54.0), (NO2, 53.0), [0.0, 0.2, 0.3, 0.1]),
        depth_two((PM10, 154.0), (SO2, 75.0), [-0.1, 0.3, 0.4, 0.5]),
        depth_two((CO, 9.5), (SO2, 185.0), [-0.3, 0.4, 0.6, 0.9]),
    ];
    json!({
        "kind": "tree_ensemble",
        "classes": CLASSES,
        "num_features": FEATURE_NAMES.len(),
        "base_score": 0.5,
        "trees": trees,
        "feature_names": FEATURE_NAMES,
    })
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing artifact")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    for (file, artifact) in [
        ("logistic_regression.json", logistic_regression()),
        ("xgboost.json", xgboost()),
    ] {
        let path = out_dir.join(file);
        write_json(&path, &artifact)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
