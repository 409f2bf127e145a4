//! Error types.
//!
//! Two layers, matching the binary/library split:
//!
//! - `ModelError`: typed failures raised by encoders and fitted models
//! - `AppError`: what the binary surfaces, an exit code plus message
//!
//! Exit codes: 2 = input/usage/config, 3 = no usable data, 4 = internal/numeric.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures raised by encoders and fitted models.
///
/// Structural mismatches (unknown labels, unfitted models) are always surfaced;
/// they must never be defaulted away. Missing *values* are not errors, just
/// `None` fields filtered out before fitting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// The model carries no fitted parameters (e.g. a corrupt artifact).
    #[error("model has no fitted parameters")]
    NotFitted,
    /// A label outside the encoder's fitted vocabulary.
    #[error("unknown category label '{0}'")]
    UnknownCategory(String),
    /// A code outside the encoder's fitted range.
    #[error("category code {code} out of range (encoder has {len} labels)")]
    CodeOutOfRange { code: usize, len: usize },
    /// The classifier predicted a type the outcome model's encoder never saw.
    ///
    /// Indicates a label-set mismatch between the two training stages.
    #[error("event type '{0}' is not in the outcome model's fitted vocabulary")]
    UnseenEventType(String),
    #[error("non-finite value in feature column {0}")]
    NonFiniteFeature(usize),
    #[error("no eligible rows in training set")]
    EmptyTrainingSet,
    #[error("training set has {n} eligible rows, need at least {needed}")]
    TooFewRows { n: usize, needed: usize },
    #[error("least-squares system for target '{0}' is too ill-conditioned to solve")]
    Singular(String),
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        let exit_code = match err {
            ModelError::EmptyTrainingSet | ModelError::TooFewRows { .. } => 3,
            _ => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_map_to_exit_codes() {
        let app: AppError = ModelError::EmptyTrainingSet.into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = ModelError::NotFitted.into();
        assert_eq!(app.exit_code(), 4);

        let app: AppError = ModelError::UnseenEventType("Tsunami".to_string()).into();
        assert_eq!(app.exit_code(), 4);
        assert!(app.to_string().contains("Tsunami"));
    }
}
