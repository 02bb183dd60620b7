use std::path::Path;

use crate::config::AppConfig;
use crate::data::export;
use crate::data::features::{Feature, FeatureVector};
use crate::data::predict::{run_predictions, PredictionReport};
use crate::data::registry::ModelRegistry;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Prediction,
    Pollutants,
    Protection,
    Results,
    About,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Prediction,
        Tab::Pollutants,
        Tab::Protection,
        Tab::Results,
        Tab::About,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Prediction => "📊 Prediction",
            Tab::Pollutants => "🌫 Pollutants",
            Tab::Protection => "🛡 Protection Tips",
            Tab::Results => "📈 Results",
            Tab::About => "ℹ About",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Raw form values, in [`Feature::ALL`] order.
    pub inputs: [f64; 9],

    /// Models to run, fixed at startup.
    pub registry: ModelRegistry,

    /// Outcome of the last "predict" action (None until the first one).
    pub report: Option<PredictionReport>,

    pub tab: Tab,

    /// File name proposed by the export dialog.
    pub export_file_name: String,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default(), ModelRegistry::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig, registry: ModelRegistry) -> Self {
        Self {
            inputs: [0.0; 9],
            registry,
            report: None,
            tab: Tab::default(),
            export_file_name: config.export_file_name,
            status_message: None,
        }
    }

    /// Current form values as a clamped feature vector.
    pub fn features(&self) -> FeatureVector {
        FeatureVector::from_values(self.inputs)
    }

    pub fn set_input(&mut self, feature: Feature, value: f64) {
        self.inputs[feature as usize] = feature.clamp(value);
    }

    /// Run every registered model and replace the previous report.
    pub fn predict(&mut self) {
        let report = run_predictions(&self.features(), &self.registry);
        let ok = report.successes().count();
        self.status_message = Some(format!(
            "{ok} of {} model(s) produced a prediction",
            report.len()
        ));
        self.report = Some(report);
    }

    /// Whether there is anything to show in the results tab.
    pub fn has_results(&self) -> bool {
        self.report
            .as_ref()
            .is_some_and(|r| r.successes().next().is_some())
    }

    /// Write the current results to `path`, reporting the outcome in the status line.
    pub fn export_to(&mut self, path: &Path) {
        let Some(report) = &self.report else {
            self.status_message = Some("Nothing to export yet".to_string());
            return;
        };
        match export::save_csv(report, path) {
            Ok(()) => {
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export CSV: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
