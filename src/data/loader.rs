use std::path::Path;

use anyhow::{bail, Context, Result};

use super::model::{expected_feature_names, Artifact, Predictor};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a model artifact from disk.  Dispatch by extension, then by the
/// artifact's `kind` tag.
///
/// Supported formats:
/// * `.json` – `{ "kind": "logistic_regression" | "tree_ensemble", ... }`
pub fn load_artifact(path: &Path) -> Result<Box<dyn Predictor>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(path),
        other => bail!("Unsupported artifact extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Box<dyn Predictor>> {
    let text = std::fs::read_to_string(path).context("reading model artifact")?;
    let artifact: Artifact = serde_json::from_str(&text).context("parsing model artifact")?;

    if let Some(names) = artifact.feature_names() {
        let ours = expected_feature_names();
        if names != ours.as_slice() {
            log::warn!(
                "{} was trained on columns {:?}, inputs are sent as {:?}",
                path.display(),
                names,
                ours
            );
        }
    }

    artifact
        .into_predictor()
        .with_context(|| format!("invalid model in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).expect("write artifact");
        path
    }

    #[test]
    fn loads_logistic_regression() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = write(
            tmp.path(),
            "lr.json",
            r#"{"kind":"logistic_regression","classes":["Good","Poor"],
                "coefficients":[[0,0,0.1,0,0,0,0,0,0]],"intercepts":[-3.5]}"#,
        );
        let model = load_artifact(&path).expect("load");
        assert_eq!(model.kind(), "logistic_regression");
        assert_eq!(model.expected_feature_count(), Some(9));
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = write(tmp.path(), "model.pkl", "\u{80}\u{04}");
        let err = load_artifact(&path).err().expect("should fail");
        assert!(err.to_string().contains(".pkl"));
    }

    #[test]
    fn rejects_unknown_kind() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = write(tmp.path(), "m.json", r#"{"kind":"random_forest","classes":["a","b"]}"#);
        let err = load_artifact(&path).err().expect("should fail");
        assert!(format!("{err:#}").contains("parsing model artifact"));
    }

    #[test]
    fn rejects_corrupt_json() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = write(tmp.path(), "m.json", "{ not json");
        assert!(load_artifact(&path).is_err());
    }

    #[test]
    fn structural_errors_name_the_file() {
        let tmp = tempfile::tempdir().expect("tmpdir");
        let path = write(
            tmp.path(),
            "bad.json",
            r#"{"kind":"logistic_regression","classes":["Good"],
                "coefficients":[[1.0]],"intercepts":[0.0]}"#,
        );
        let err = load_artifact(&path).err().expect("should fail");
        let msg = format!("{err:#}");
        assert!(msg.contains("bad.json"));
        assert!(msg.contains("at least two classes"));
    }
}
