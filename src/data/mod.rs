/// Data layer: inputs, model artifacts, prediction and export.
///
/// Architecture:
/// ```text
///   form values
///        │
///        ▼
///   ┌──────────────┐
///   │ FeatureVector │  nine clamped measurements, fixed order
///   └──────────────┘
///        │            ModelRegistry (name → artifact path)
///        ▼                  │
///   ┌──────────┐            │
///   │ predict   │ ◄─────────┘  per model: exists? → loader → shape → predict
///   └──────────┘
///        │
///        ▼
///   ┌──────────────────┐
///   │ PredictionReport  │  label or ModelFailure per model
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Model,Prediction CSV
///   └──────────┘
/// ```

pub mod export;
pub mod features;
pub mod loader;
pub mod model;
pub mod predict;
pub mod registry;
