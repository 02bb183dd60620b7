use std::fmt;

use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::{Feature, FeatureVector};

// ---------------------------------------------------------------------------
// Predictor – the capability every loaded artifact exposes
// ---------------------------------------------------------------------------

/// A loaded, ready-to-use classifier.
pub trait Predictor {
    /// Short identifier of the model family, used in logs.
    fn kind(&self) -> &'static str;

    /// Number of input features the model was trained on, if it declares one.
    fn expected_feature_count(&self) -> Option<usize>;

    /// Classify a single observation.
    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictError>;
}

/// The class chosen by a predictor together with its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub class: String,
    /// Probability of `class`, in `[0, 1]`.
    pub confidence: f64,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class)
    }
}

/// Failures raised while evaluating a model on a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("expected {expected} input values, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[error("input '{feature}' is not a finite number")]
    NonFiniteInput { feature: &'static str },
    #[error("model produced a non-finite score")]
    NonFiniteScore,
    #[error("tree {tree} references missing node {node}")]
    NodeOutOfBounds { tree: usize, node: usize },
    #[error("tree {tree} never reaches a leaf")]
    TraversalLoop { tree: usize },
}

// ---------------------------------------------------------------------------
// Artifact – on-disk representation, dispatched by its `kind` tag
// ---------------------------------------------------------------------------

/// A serialized model as written by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    LogisticRegression(LogisticRegression),
    TreeEnsemble(TreeEnsemble),
}

impl Artifact {
    /// Check structural integrity and turn the artifact into a predictor.
    pub fn into_predictor(self) -> Result<Box<dyn Predictor>> {
        match self {
            Artifact::LogisticRegression(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
            Artifact::TreeEnsemble(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
        }
    }

    /// Column names recorded at training time, if any.
    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Artifact::LogisticRegression(m) => m.feature_names.as_deref(),
            Artifact::TreeEnsemble(m) => m.feature_names.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared maths
// ---------------------------------------------------------------------------

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Numerically stable softmax.
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest probability; the first one wins ties.
fn argmax(probs: &[f64]) -> usize {
    let mut best = 0;
    for (i, p) in probs.iter().enumerate() {
        if *p > probs[best] {
            best = i;
        }
    }
    best
}

fn check_inputs(features: &FeatureVector, expected: usize) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::InputLength {
            expected,
            actual: features.len(),
        });
    }
    match features.iter().find(|(_, v)| !v.is_finite()) {
        Some((feature, _)) => Err(PredictError::NonFiniteInput {
            feature: feature.key(),
        }),
        None => Ok(()),
    }
}

/// Turn a binary positive-class probability into a label.
fn binary_label(classes: &[String], p1: f64) -> Result<Label, PredictError> {
    if !p1.is_finite() {
        return Err(PredictError::NonFiniteScore);
    }
    if p1 > 0.5 {
        Ok(Label { class: classes[1].clone(), confidence: p1 })
    } else {
        Ok(Label { class: classes[0].clone(), confidence: 1.0 - p1 })
    }
}

fn multiclass_label(classes: &[String], margins: &[f64]) -> Result<Label, PredictError> {
    if margins.iter().any(|m| !m.is_finite()) {
        return Err(PredictError::NonFiniteScore);
    }
    let probs = softmax(margins);
    let best = argmax(&probs);
    Ok(Label {
        class: classes[best].clone(),
        confidence: probs[best],
    })
}

fn validate_classes(classes: &[String]) -> Result<()> {
    ensure!(classes.len() >= 2, "model must declare at least two classes, found {}", classes.len());
    Ok(())
}

fn validate_feature_names(names: Option<&[String]>, count: usize) -> Result<()> {
    if let Some(names) = names {
        ensure!(
            names.len() == count,
            "feature_names lists {} columns but the model uses {count}",
            names.len()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Logistic regression
// ---------------------------------------------------------------------------

/// Linear classifier with the same decision rule as scikit-learn's
/// `LogisticRegression`.
///
/// * binary: one coefficient row, `P(classes[1]) = σ(w·x + b)`
/// * multinomial: one row per class, softmax over the linear scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    /// `[n_rows][n_features]`
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<()> {
        validate_classes(&self.classes)?;
        let Some(first) = self.coefficients.first() else {
            bail!("logistic regression has no coefficient rows");
        };
        ensure!(!first.is_empty(), "logistic regression coefficient rows are empty");
        for (i, row) in self.coefficients.iter().enumerate() {
            ensure!(
                row.len() == first.len(),
                "coefficient row {i} has {} values, expected {}",
                row.len(),
                first.len()
            );
        }
        ensure!(
            self.intercepts.len() == self.coefficients.len(),
            "{} intercepts for {} coefficient rows",
            self.intercepts.len(),
            self.coefficients.len()
        );
        let binary = self.classes.len() == 2 && self.coefficients.len() == 1;
        ensure!(
            binary || self.coefficients.len() == self.classes.len(),
            "{} coefficient rows do not match {} classes",
            self.coefficients.len(),
            self.classes.len()
        );
        validate_feature_names(self.feature_names.as_deref(), first.len())
    }

    fn n_features(&self) -> usize {
        self.coefficients.first().map(Vec::len).unwrap_or(0)
    }

    fn scores(&self, x: &[f64]) -> Vec<f64> {
        self.coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + b)
            .collect()
    }
}

impl Predictor for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn expected_feature_count(&self) -> Option<usize> {
        Some(self.n_features())
    }

    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictError> {
        check_inputs(features, self.n_features())?;
        let scores = self.scores(features.as_slice());
        if scores.len() == 1 {
            binary_label(&self.classes, sigmoid(scores[0]))
        } else {
            multiclass_label(&self.classes, &scores)
        }
    }
}

// ---------------------------------------------------------------------------
// Gradient-boosted tree ensemble
// ---------------------------------------------------------------------------

/// One node of a regression tree, stored in a flat array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Direction taken when the feature value is missing (NaN).
        #[serde(default = "default_left")]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_left() -> bool {
    true
}

/// A single regression tree; the root is `nodes[0]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Walk from the root to a leaf. `x < threshold` goes left.
    pub fn leaf_value(&self, tree: usize, x: &[f64]) -> Result<f64, PredictError> {
        let mut idx = 0;
        // A well-formed tree reaches a leaf in at most `nodes.len()` lookups;
        // the extra pass lets a dangling last hop surface as out-of-bounds.
        for _ in 0..=self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or(PredictError::NodeOutOfBounds { tree, node: idx })?;
            match node {
                Node::Leaf { value } => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let value = x.get(*feature).copied().unwrap_or(f64::NAN);
                    let go_left = if value.is_nan() {
                        *default_left
                    } else {
                        value < *threshold
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
        Err(PredictError::TraversalLoop { tree })
    }
}

/// Additive tree ensemble evaluated like XGBoost's `binary:logistic` and
/// `multi:softprob` objectives.
///
/// For more than two classes, tree `i` contributes to class `i % n_classes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub classes: Vec<String>,
    pub num_features: usize,
    /// Binary: prior probability of `classes[1]`. Multiclass: raw margin
    /// added to every class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_score: Option<f64>,
    pub trees: Vec<Tree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl TreeEnsemble {
    fn group_size(&self) -> usize {
        if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_classes(&self.classes)?;
        ensure!(self.num_features > 0, "tree ensemble declares zero features");
        ensure!(!self.trees.is_empty(), "tree ensemble has no trees");
        ensure!(
            self.trees.len() % self.group_size() == 0,
            "{} trees cannot be split evenly across {} classes",
            self.trees.len(),
            self.group_size()
        );
        if self.group_size() == 1 {
            if let Some(p) = self.base_score {
                ensure!(p > 0.0 && p < 1.0, "binary base_score must lie in (0, 1), got {p}");
            }
        }
        for (t, tree) in self.trees.iter().enumerate() {
            ensure!(!tree.nodes.is_empty(), "tree {t} has no nodes");
            for node in &tree.nodes {
                if let Node::Split { feature, .. } = node {
                    ensure!(
                        *feature < self.num_features,
                        "tree {t} splits on feature {feature} but the model has {}",
                        self.num_features
                    );
                }
            }
        }
        validate_feature_names(self.feature_names.as_deref(), self.num_features)
    }

    fn margins(&self, x: &[f64]) -> Result<Vec<f64>, PredictError> {
        let group = self.group_size();
        let base = if group == 1 {
            logit(self.base_score.unwrap_or(0.5))
        } else {
            self.base_score.unwrap_or(0.0)
        };
        let mut margins = vec![base; group];
        for (t, tree) in self.trees.iter().enumerate() {
            margins[t % group] += tree.leaf_value(t, x)?;
        }
        Ok(margins)
    }
}

impl Predictor for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn expected_feature_count(&self) -> Option<usize> {
        Some(self.num_features)
    }

    fn predict(&self, features: &FeatureVector) -> Result<Label, PredictError> {
        check_inputs(features, self.num_features)?;
        let margins = self.margins(features.as_slice())?;
        if margins.len() == 1 {
            if !margins[0].is_finite() {
                return Err(PredictError::NonFiniteScore);
            }
            binary_label(&self.classes, sigmoid(margins[0]))
        } else {
            multiclass_label(&self.classes, &margins)
        }
    }
}

/// Column names this crate feeds to models, in order.
pub fn expected_feature_names() -> Vec<String> {
    Feature::ALL.iter().map(|f| f.key().to_string()).collect()
}
