use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::export::EXPORT_FILE_NAME;
use crate::data::registry::{ModelRegistry, DEFAULT_MODELS};

/// Looked up in the working directory when no path is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "air_quality.json";

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Startup configuration. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Directory that relative artifact paths are resolved against.
    pub artifacts_dir: PathBuf,
    /// Registered models, in display order.
    pub models: Vec<ModelEntry>,
    /// File name proposed by the export dialog.
    pub export_file_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelEntry {
    pub name: String,
    pub path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("."),
            models: DEFAULT_MODELS
                .iter()
                .map(|(name, file)| ModelEntry {
                    name: name.to_string(),
                    path: PathBuf::from(file),
                })
                .collect(),
            export_file_name: EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Resolve the config to use at startup.
    ///
    /// An explicit path must load. Without one, `air_quality.json` is used if
    /// present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::from_file(path)
                } else {
                    log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Build the model registry, resolving relative paths against `artifacts_dir`.
    pub fn registry(&self) -> Result<ModelRegistry> {
        ModelRegistry::new(
            self.models
                .iter()
                .map(|m| (m.name.clone(), self.artifacts_dir.join(&m.path))),
        )
        .context("invalid model list in config")
    }
}
