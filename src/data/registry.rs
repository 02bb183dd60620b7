use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};

// ---------------------------------------------------------------------------
// ModelRegistry – display name → artifact path, in a fixed order
// ---------------------------------------------------------------------------

/// Default display names and artifact files shipped with the dashboard.
pub const DEFAULT_MODELS: [(&str, &str); 2] = [
    ("Logistic Regression", "logistic_regression.json"),
    ("XGBoost", "xgboost.json"),
];

/// Static mapping from model name to artifact location.
///
/// Iteration order is insertion order so result tables are reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRegistry {
    entries: Vec<(String, PathBuf)>,
}

impl ModelRegistry {
    /// Build a registry, rejecting empty or duplicate names.
    pub fn new<I, S, P>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        let mut registry = Self::default();
        for (name, path) in entries {
            let name = name.into();
            ensure!(!name.trim().is_empty(), "model name must not be empty");
            ensure!(
                registry.path_of(&name).is_none(),
                "model '{name}' is registered twice"
            );
            registry.entries.push((name, path.into()));
        }
        Ok(registry)
    }

    /// The two stock models, resolved against `dir`.
    pub fn with_defaults(dir: &Path) -> Self {
        Self {
            entries: DEFAULT_MODELS
                .iter()
                .map(|(name, file)| (name.to_string(), dir.join(file)))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_path()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn path_of(&self, name: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
