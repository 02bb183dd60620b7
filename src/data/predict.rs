use std::any::Any;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use super::features::FeatureVector;
use super::loader::load_artifact;
use super::model::{Label, Predictor};
use super::registry::ModelRegistry;

// ---------------------------------------------------------------------------
// Per-model outcome
// ---------------------------------------------------------------------------

/// Why a single model produced no label. Never fatal for the other models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFailure {
    #[error("artifact '{}' not found", .path.display())]
    ArtifactNotFound { path: PathBuf },
    #[error("could not load model: {message}")]
    Deserialization { message: String },
    #[error("model expects {expected} features, got {actual}")]
    FeatureShapeMismatch { expected: usize, actual: usize },
    #[error("prediction failed: {message}")]
    PredictionRuntime { message: String },
}

/// Outcome of one registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutcome {
    pub model: String,
    pub result: Result<Label, ModelFailure>,
}

/// Everything one "predict" action produced, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionReport {
    pub outcomes: Vec<ModelOutcome>,
}

impl PredictionReport {
    /// Models that produced a label, in registry order.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &Label)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|l| (o.model.as_str(), l)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ModelFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.model.as_str(), e)))
    }

    /// `(Model, Prediction)` rows for the results table and CSV export.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.successes()
            .map(|(m, l)| (m.to_string(), l.class.clone()))
            .collect()
    }

    #[cfg(test)]
    pub fn get(&self, model: &str) -> Option<&Result<Label, ModelFailure>> {
        self.outcomes.iter().find(|o| o.model == model).map(|o| &o.result)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Run every registered model against `features`.
///
/// Each model is attempted exactly once; a failing model is recorded and the
/// loop moves on.
pub fn run_predictions(features: &FeatureVector, registry: &ModelRegistry) -> PredictionReport {
    run_predictions_with(features, registry, load_artifact)
}

/// Same as [`run_predictions`] with a caller-supplied artifact loader.
pub fn run_predictions_with<L>(
    features: &FeatureVector,
    registry: &ModelRegistry,
    load: L,
) -> PredictionReport
where
    L: Fn(&Path) -> Result<Box<dyn Predictor>>,
{
    log::info!("Running {} model(s)", registry.len());

    let outcomes = registry
        .iter()
        .map(|(name, path)| {
            log::debug!("Predicting with '{name}' from {}", path.display());
            let result = predict_one(features, path, &load);
            match &result {
                Ok(label) => log::info!(
                    "{name} predicts {label} ({:.1}%)",
                    label.confidence * 100.0
                ),
                Err(e) => log::warn!("{name}: {e}"),
            }
            ModelOutcome {
                model: name.to_string(),
                result,
            }
        })
        .collect();

    PredictionReport { outcomes }
}

fn predict_one<L>(features: &FeatureVector, path: &Path, load: &L) -> Result<Label, ModelFailure>
where
    L: Fn(&Path) -> Result<Box<dyn Predictor>>,
{
    if !is_readable_file(path) {
        return Err(ModelFailure::ArtifactNotFound {
            path: path.to_path_buf(),
        });
    }

    let model = load(path).map_err(|e| ModelFailure::Deserialization {
        message: format!("{e:#}"),
    })?;
    log::debug!("Loaded {} from {}", model.kind(), path.display());

    if let Some(expected) = model.expected_feature_count() {
        if expected != features.len() {
            return Err(ModelFailure::FeatureShapeMismatch {
                expected,
                actual: features.len(),
            });
        }
    }

    match panic::catch_unwind(AssertUnwindSafe(|| model.predict(features))) {
        Ok(Ok(label)) => Ok(label),
        Ok(Err(e)) => Err(ModelFailure::PredictionRuntime {
            message: e.to_string(),
        }),
        Err(payload) => Err(ModelFailure::PredictionRuntime {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("model panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("model panicked: {s}")
    } else {
        "model panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::data::model::PredictError;

    const LR: &str = r#"{"kind":"logistic_regression","classes":["Good","Poor"],
        "coefficients":[[0,0,0.1,0,0,0,0,0,0]],"intercepts":[-3.5]}"#;

    const XGB: &str = r#"{"kind":"tree_ensemble","classes":["Good","Moderate","Poor"],
        "num_features":9,"trees":[
          {"nodes":[{"feature":2,"threshold":12.0,"left":1,"right":2},{"value":1.0},{"value":-1.0}]},
          {"nodes":[{"feature":2,"threshold":35.0,"left":1,"right":2},{"value":0.5},{"value":-0.5}]},
          {"nodes":[{"feature":2,"threshold":35.0,"left":1,"right":2},{"value":-1.0},{"value":1.0}]}
        ]}"#;

    const LR_EIGHT: &str = r#"{"kind":"logistic_regression","classes":["Good","Poor"],
        "coefficients":[[0,0,0.1,0,0,0,0,0]],"intercepts":[0.0]}"#;

    fn features(pm25: f64) -> FeatureVector {
        FeatureVector::from_values([22.0, 60.0, pm25, 25.0, 12.0, 3.0, 0.3, 5.0, 1200.0])
    }

    fn artifacts(files: &[(&str, &str)]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().expect("tmpdir");
        for (name, body) in files {
            std::fs::write(tmp.path().join(name), body).expect("write");
        }
        tmp
    }

    #[test]
    fn two_valid_models_give_two_rows_in_order() {
        let tmp = artifacts(&[("logistic_regression.json", LR), ("xgboost.json", XGB)]);
        let registry = ModelRegistry::with_defaults(tmp.path());

        let report = run_predictions(&features(20.0), &registry);

        assert_eq!(report.len(), 2);
        assert_eq!(
            report.rows(),
            vec![
                ("Logistic Regression".to_string(), "Good".to_string()),
                ("XGBoost".to_string(), "Moderate".to_string()),
            ]
        );
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn missing_artifact_does_not_affect_others() {
        let tmp = artifacts(&[("xgboost.json", XGB)]);
        let registry = ModelRegistry::with_defaults(tmp.path());

        let report = run_predictions(&features(50.0), &registry);

        assert_eq!(
            report.get("Logistic Regression"),
            Some(&Err(ModelFailure::ArtifactNotFound {
                path: tmp.path().join("logistic_regression.json"),
            }))
        );
        assert_eq!(report.get("XGBoost").unwrap().as_ref().unwrap().class, "Poor");
        assert_eq!(report.rows().len(), 1);
    }

    #[test]
    fn directory_is_not_an_artifact() {
        let tmp = artifacts(&[]);
        std::fs::create_dir(tmp.path().join("xgboost.json")).unwrap();
        let registry = ModelRegistry::new([("XGBoost", tmp.path().join("xgboost.json"))]).unwrap();

        let report = run_predictions(&features(1.0), &registry);
        assert!(matches!(
            report.get("XGBoost"),
            Some(Err(ModelFailure::ArtifactNotFound { .. }))
        ));
    }

    #[test]
    fn corrupt_artifact_is_a_deserialization_failure() {
        let tmp = artifacts(&[("logistic_regression.json", "{ truncated"), ("xgboost.json", XGB)]);
        let registry = ModelRegistry::with_defaults(tmp.path());

        let report = run_predictions(&features(5.0), &registry);

        assert!(matches!(
            report.get("Logistic Regression"),
            Some(Err(ModelFailure::Deserialization { .. }))
        ));
        assert_eq!(report.get("XGBoost").unwrap().as_ref().unwrap().class, "Good");
    }

    #[test]
    fn shape_mismatch_reports_both_counts() {
        let tmp = artifacts(&[("logistic_regression.json", LR_EIGHT), ("xgboost.json", XGB)]);
        let registry = ModelRegistry::with_defaults(tmp.path());

        let report = run_predictions(&features(5.0), &registry);

        assert_eq!(
            report.get("Logistic Regression"),
            Some(&Err(ModelFailure::FeatureShapeMismatch { expected: 8, actual: 9 }))
        );
        assert!(report.get("XGBoost").unwrap().is_ok());
    }

    struct Spy {
        width: Option<usize>,
        calls: Rc<Cell<usize>>,
        outcome: fn() -> Result<Label, PredictError>,
    }

    impl Predictor for Spy {
        fn kind(&self) -> &'static str {
            "spy"
        }

        fn expected_feature_count(&self) -> Option<usize> {
            self.width
        }

        fn predict(&self, _features: &FeatureVector) -> Result<Label, PredictError> {
            self.calls.set(self.calls.get() + 1);
            (self.outcome)()
        }
    }

    fn ok_label() -> Result<Label, PredictError> {
        Ok(Label { class: "Good".into(), confidence: 1.0 })
    }

    fn spy_registry(tmp: &tempfile::TempDir) -> ModelRegistry {
        std::fs::write(tmp.path().join("spy.bin"), b"x").unwrap();
        ModelRegistry::new([("Spy", tmp.path().join("spy.bin"))]).unwrap()
    }

    #[test]
    fn mismatched_model_is_never_called() {
        let tmp = artifacts(&[]);
        let registry = spy_registry(&tmp);
        let calls = Rc::new(Cell::new(0));

        let c = calls.clone();
        let report = run_predictions_with(&features(1.0), &registry, move |_| {
            Ok(Box::new(Spy { width: Some(4), calls: c.clone(), outcome: ok_label }) as Box<dyn Predictor>)
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(
            report.get("Spy"),
            Some(&Err(ModelFailure::FeatureShapeMismatch { expected: 4, actual: 9 }))
        );
    }

    #[test]
    fn undeclared_width_skips_shape_check() {
        let tmp = artifacts(&[]);
        let registry = spy_registry(&tmp);
        let calls = Rc::new(Cell::new(0));

        let c = calls.clone();
        let report = run_predictions_with(&features(1.0), &registry, move |_| {
            Ok(Box::new(Spy { width: None, calls: c.clone(), outcome: ok_label }) as Box<dyn Predictor>)
        });

        assert_eq!(calls.get(), 1);
        assert_eq!(report.rows().len(), 1);
    }

    #[test]
    fn runtime_error_and_panic_are_contained() {
        fn fails() -> Result<Label, PredictError> {
            Err(PredictError::NonFiniteScore)
        }
        fn panics() -> Result<Label, PredictError> {
            panic!("boom")
        }

        let tmp = artifacts(&[]);
        for name in ["a.bin", "b.bin", "c.bin"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let registry = ModelRegistry::new([
            ("A", tmp.path().join("a.bin")),
            ("B", tmp.path().join("b.bin")),
            ("C", tmp.path().join("c.bin")),
        ])
        .unwrap();

        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let report = run_predictions_with(&features(1.0), &registry, move |path| {
            let outcome = match path.file_name().and_then(|n| n.to_str()) {
                Some("a.bin") => fails,
                Some("b.bin") => panics,
                _ => ok_label,
            };
            Ok(Box::new(Spy { width: Some(9), calls: c.clone(), outcome }) as Box<dyn Predictor>)
        });

        assert_eq!(calls.get(), 3);
        assert_eq!(
            report.get("A"),
            Some(&Err(ModelFailure::PredictionRuntime {
                message: "model produced a non-finite score".into()
            }))
        );
        assert_eq!(
            report.get("B"),
            Some(&Err(ModelFailure::PredictionRuntime {
                message: "model panicked: boom".into()
            }))
        );
        assert!(report.get("C").unwrap().is_ok());
    }

    #[test]
    fn every_entry_maps_to_a_registry_name() {
        let tmp = artifacts(&[("logistic_regression.json", LR)]);
        let registry = ModelRegistry::with_defaults(tmp.path());
        let report = run_predictions(&features(3.0), &registry);

        assert!(report.len() <= registry.len());
        for outcome in &report.outcomes {
            assert!(registry.path_of(&outcome.model).is_some());
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let tmp = artifacts(&[("logistic_regression.json", LR), ("xgboost.json", XGB)]);
        let registry = ModelRegistry::with_defaults(tmp.path());
        let fv = features(42.0);
        assert_eq!(run_predictions(&fv, &registry), run_predictions(&fv, &registry));
    }

    #[test]
    fn empty_registry_gives_empty_report() {
        let report = run_predictions(&features(1.0), &ModelRegistry::default());
        assert_eq!(report.len(), 0);
        assert!(report.rows().is_empty());
    }

    const XGB_DANGLING: &str = r#"{"kind":"tree_ensemble","classes":["Good","Poor"],
        "num_features":9,"trees":[
          {"nodes":[{"feature":2,"threshold":12.0,"left":1,"right":1},
                    {"feature":3,"threshold":50.0,"left":9,"right":9}]}
        ]}"#;

    const XGB_CYCLE: &str = r#"{"kind":"tree_ensemble","classes":["Good","Poor"],
        "num_features":9,"trees":[
          {"nodes":[{"feature":2,"threshold":12.0,"left":1,"right":1},
                    {"feature":3,"threshold":50.0,"left":0,"right":0}]}
        ]}"#;

    #[test]
    fn dangling_tree_child_is_a_runtime_failure() {
        let tmp = artifacts(&[("logistic_regression.json", LR), ("xgboost.json", XGB_DANGLING)]);
        let registry = ModelRegistry::with_defaults(tmp.path());

        let report = run_predictions(&features(5.0), &registry);

        assert_eq!(
            report.get("XGBoost"),
            Some(&Err(ModelFailure::PredictionRuntime {
                message: "tree 0 references missing node 9".into()
            }))
        );
        assert_eq!(
            report.rows(),
            vec![("Logistic Regression".to_string(), "Good".to_string())]
        );
    }

    #[test]
    fn cyclic_tree_is_a_runtime_failure() {
        let tmp = artifacts(&[("logistic_regression.json", LR), ("xgboost.json", XGB_CYCLE)]);
        let registry = ModelRegistry::with_defaults(tmp.path());

        let report = run_predictions(&features(5.0), &registry);

        assert_eq!(
            report.get("XGBoost"),
            Some(&Err(ModelFailure::PredictionRuntime {
                message: "tree 0 never reaches a leaf".into()
            }))
        );
        assert!(report.get("Logistic Regression").unwrap().is_ok());
    }

    #[test]
    fn pickle_artifact_is_a_deserialization_failure() {
        let tmp = artifacts(&[("logistic_regression.pkl", "\u{80}\u{04}\u{95}"), ("xgboost.json", XGB)]);
        let registry = ModelRegistry::new([
            ("Logistic Regression", tmp.path().join("logistic_regression.pkl")),
            ("XGBoost", tmp.path().join("xgboost.json")),
        ])
        .unwrap();

        let report = run_predictions(&features(5.0), &registry);

        match report.get("Logistic Regression") {
            Some(Err(ModelFailure::Deserialization { message })) => {
                assert!(message.contains("Unsupported artifact extension: .pkl"), "{message}");
            }
            other => panic!("expected a deserialization failure, got {other:?}"),
        }
        assert_eq!(report.get("XGBoost").unwrap().as_ref().unwrap().class, "Good");
    }
}
