//! Read/write model artifact JSON files.
//!
//! A trained pipeline is three files in the model directory:
//! - `classifier.json` (KNN event-type classifier)
//! - `regressor.json` (least-squares outcome regressor)
//! - `event_encoder.json` (event-type label/code vocabulary)
//!
//! Each file wraps its model in a common envelope (`tool`, `version`, `kind`)
//! so a load can reject files written by other tools, future format versions,
//! or the wrong artifact handed over at the right path. JSON numbers round-trip
//! `f64` exactly, so a reloaded model predicts bit-for-bit what the trained
//! one did.

use std::fmt;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const TOOL_NAME: &str = "stormcast";
const ARTIFACT_VERSION: u32 = 1;

/// Which of the three artifact files a payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Classifier,
    Regressor,
    EventEncoder,
}

impl ArtifactKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Classifier => "classifier.json",
            ArtifactKind::Regressor => "regressor.json",
            ArtifactKind::EventEncoder => "event_encoder.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ArtifactKind::Classifier => "classifier",
            ArtifactKind::Regressor => "regressor",
            ArtifactKind::EventEncoder => "event_encoder",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactFile<T> {
    tool: String,
    version: u32,
    kind: ArtifactKind,
    model: T,
}

pub fn artifact_path(dir: &Path, kind: ArtifactKind) -> PathBuf {
    dir.join(kind.file_name())
}

/// Create the model directory if it does not exist yet.
pub fn ensure_model_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create model directory '{}': {e}", dir.display()),
        )
    })
}

/// Write one artifact file into the model directory.
pub fn save_model_file<T: Serialize>(
    dir: &Path,
    kind: ArtifactKind,
    model: &T,
) -> Result<(), AppError> {
    let path = artifact_path(dir, kind);
    let file = File::create(&path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create artifact '{}': {e}", path.display()),
        )
    })?;

    let artifact = ArtifactFile {
        tool: TOOL_NAME.to_string(),
        version: ARTIFACT_VERSION,
        kind,
        model,
    };
    serde_json::to_writer_pretty(file, &artifact)
        .map_err(|e| AppError::new(2, format!("Failed to write artifact '{}': {e}", path.display())))?;

    Ok(())
}

/// Load one artifact file from the model directory, checking its envelope.
pub fn load_model_file<T: DeserializeOwned>(dir: &Path, kind: ArtifactKind) -> Result<T, AppError> {
    let path = artifact_path(dir, kind);
    let text = fs::read_to_string(&path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open artifact '{}': {e}", path.display()),
        )
    })?;
    decode_artifact(&text, kind)
        .map_err(|message| AppError::new(2, format!("{}: {message}", path.display())))
}

fn decode_artifact<T: DeserializeOwned>(text: &str, expected: ArtifactKind) -> Result<T, String> {
    let artifact: ArtifactFile<T> =
        serde_json::from_str(text).map_err(|e| format!("Invalid artifact JSON: {e}"))?;

    if artifact.tool != TOOL_NAME {
        return Err(format!(
            "Not a {TOOL_NAME} artifact (tool = '{}').",
            artifact.tool
        ));
    }
    if artifact.version != ARTIFACT_VERSION {
        return Err(format!(
            "Unsupported artifact version {} (this build reads version {ARTIFACT_VERSION}).",
            artifact.version
        ));
    }
    if artifact.kind != expected {
        return Err(format!(
            "Wrong artifact kind: expected `{expected}`, found `{}`.",
            artifact.kind
        ));
    }

    Ok(artifact.model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::CategoryEncoder;

    fn encoder_json(tool: &str, version: u32, kind: &str) -> String {
        format!(
            r#"{{"tool":"{tool}","version":{version},"kind":"{kind}","model":{{"labels":["Hail","Tornado"]}}}}"#
        )
    }

    #[test]
    fn envelope_round_trips_through_json() {
        let mut encoder = CategoryEncoder::new();
        encoder.fit(["Hail", "Tornado"]);

        let artifact = ArtifactFile {
            tool: TOOL_NAME.to_string(),
            version: ARTIFACT_VERSION,
            kind: ArtifactKind::EventEncoder,
            model: encoder.clone(),
        };
        let text = serde_json::to_string_pretty(&artifact).unwrap();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["tool"], "stormcast");
        assert_eq!(value["version"], 1);
        assert_eq!(value["kind"], "event_encoder");

        let back: CategoryEncoder = decode_artifact(&text, ArtifactKind::EventEncoder).unwrap();
        assert_eq!(back, encoder);
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let text = encoder_json("stormcast", 1, "event_encoder");
        let err = decode_artifact::<CategoryEncoder>(&text, ArtifactKind::Classifier).unwrap_err();
        assert!(err.contains("expected `classifier`"));
        assert!(err.contains("found `event_encoder`"));
    }

    #[test]
    fn foreign_tool_and_version_are_rejected() {
        let text = encoder_json("othertool", 1, "event_encoder");
        let err = decode_artifact::<CategoryEncoder>(&text, ArtifactKind::EventEncoder).unwrap_err();
        assert!(err.contains("Not a stormcast artifact"));

        let text = encoder_json("stormcast", 9, "event_encoder");
        let err = decode_artifact::<CategoryEncoder>(&text, ArtifactKind::EventEncoder).unwrap_err();
        assert!(err.contains("version 9"));
    }

    #[test]
    fn garbage_text_is_an_invalid_artifact() {
        let err = decode_artifact::<CategoryEncoder>("not json", ArtifactKind::Classifier).unwrap_err();
        assert!(err.contains("Invalid artifact JSON"));
    }

    #[test]
    fn file_names_are_stable() {
        assert_eq!(ArtifactKind::Classifier.file_name(), "classifier.json");
        assert_eq!(ArtifactKind::Regressor.file_name(), "regressor.json");
        assert_eq!(ArtifactKind::EventEncoder.file_name(), "event_encoder.json");
    }
}
