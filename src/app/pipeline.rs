//! Shared train/predict pipeline used by both CLI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> derive -> classifier fit -> outcome labeling -> regressor fit
//!
//! The scripted and interactive commands then focus on presentation
//! (flags vs prompts).

use std::path::Path;

use crate::domain::{EventQuery, OutcomeKind, PredictionResult, TrainConfig};
use crate::encode::CategoryEncoder;
use crate::error::{AppError, ModelError};
use crate::features;
use crate::io::artifact::{ArtifactKind, ensure_model_dir, load_model_file, save_model_file};
use crate::io::ingest::{IngestedData, load_storm_csv};
use crate::model::{
    ClassifierEvaluation, EventClassifier, OutcomeRegressor, RegressorEvaluation, TargetRow,
    clamp_outcomes,
};

/// The deployed two-stage model.
///
/// Stage one names the event type from when/where; stage two regresses the 13
/// outcome targets from the encoded type plus the same when/where features.
#[derive(Debug, Clone, Default)]
pub struct StormModel {
    pub classifier: EventClassifier,
    pub regressor: OutcomeRegressor,
    pub event_encoder: CategoryEncoder,
}

impl StormModel {
    /// Predict the event type and its outcomes for a validated query.
    ///
    /// Outcome values come back clamped (counts, damages, magnitude, duration
    /// and distance floored at 0; end coordinates and bearing untouched).
    pub fn predict_outcome(&self, query: &EventQuery) -> Result<PredictionResult, ModelError> {
        let features = query.features();
        let event_type = self.classifier.predict(&features)?;

        // A label outside the encoder vocabulary means the artifacts come
        // from mismatched training stages.
        let code = match self.event_encoder.encode(&event_type) {
            Ok(code) => code,
            Err(ModelError::UnknownCategory(label)) => {
                return Err(ModelError::UnseenEventType(label));
            }
            Err(other) => return Err(other),
        };

        let raw = self.regressor.predict(&[
            code as f64,
            features[0],
            features[1],
            features[2],
            features[3],
            features[4],
        ])?;

        Ok(PredictionResult {
            event_type,
            outcomes: clamp_outcomes(raw),
        })
    }
}

/// All computed outputs of a single `stormcast train` run.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub ingest: IngestedData,
    pub model: StormModel,
    pub classifier_eval: ClassifierEvaluation,
    pub regressor_eval: RegressorEvaluation,
    /// Rows with all 13 outcomes present, i.e. what the regressor was fit on.
    pub regressor_rows: usize,
    /// Compass vocabulary behind the direction-code target, in code order.
    pub direction_labels: Vec<String>,
}

/// Execute the full training pipeline from a CSV path.
pub fn train_models(config: &TrainConfig) -> Result<TrainOutput, AppError> {
    // 1) Ingest + row validation.
    let ingest = load_storm_csv(&config.csv_path)?;

    train_models_with_data(config, ingest)
}

/// Execute the training pipeline with pre-ingested data.
///
/// This is useful for tests and callers that already validated a CSV.
pub fn train_models_with_data(
    config: &TrainConfig,
    ingest: IngestedData,
) -> Result<TrainOutput, AppError> {
    // 2) Derive per-record columns (duration, track geometry, direction).
    let events = features::derive_all(ingest.records.clone());

    // 3) Stage one: the classifier trains on labeled rows with coordinates.
    let labeled: Vec<([f64; 5], String)> = events
        .iter()
        .filter_map(|event| {
            let features = event.classifier_features()?;
            let label = event.event_label()?;
            Some((features, label.to_string()))
        })
        .collect();
    if labeled.is_empty() {
        return Err(AppError::new(
            3,
            "No labeled rows with coordinates to fit the classifier.",
        ));
    }
    let classifier_eval = EventClassifier::evaluate(&labeled, config.seed)?;
    let classifier = EventClassifier::fit(&labeled)?;

    // 4) Stage two: rows with every outcome present. The type column is the
    //    *predicted* label so training inputs match what inference feeds in.
    let mut stage_two: Vec<([f64; 5], [f64; 12], &'static str)> = Vec::new();
    for event in &events {
        let Some(features) = event.classifier_features() else {
            continue;
        };
        let Some(numeric) = event.numeric_targets() else {
            continue;
        };
        let Some(direction) = event.derived.direction else {
            continue;
        };
        stage_two.push((features, numeric, direction.display_name()));
    }
    if stage_two.is_empty() {
        return Err(AppError::new(
            3,
            "No rows with complete outcomes to fit the regressor.",
        ));
    }

    let feature_rows: Vec<[f64; 5]> = stage_two.iter().map(|(f, _, _)| *f).collect();
    let predicted = classifier.predict_batch(&feature_rows)?;

    let mut event_encoder = CategoryEncoder::default();
    event_encoder.fit(&predicted);
    let mut direction_encoder = CategoryEncoder::default();
    direction_encoder.fit(stage_two.iter().map(|(_, _, d)| *d));

    let mut target_rows: Vec<TargetRow> = Vec::with_capacity(stage_two.len());
    for ((features, numeric, direction), label) in stage_two.iter().zip(&predicted) {
        let event_code = event_encoder.encode(label)? as f64;
        let direction_code = direction_encoder.encode(direction)? as f64;

        let mut targets = [0.0; OutcomeKind::COUNT];
        targets[..12].copy_from_slice(numeric);
        targets[OutcomeKind::DirectionCode.index()] = direction_code;

        target_rows.push((
            [
                event_code,
                features[0],
                features[1],
                features[2],
                features[3],
                features[4],
            ],
            targets,
        ));
    }

    let regressor_eval = OutcomeRegressor::evaluate(&target_rows, config.seed)?;
    let regressor = OutcomeRegressor::fit(&target_rows)?;

    // 5) Bundle the deployed model. The direction encoder is not part of it:
    //    predictions report the direction code numerically and label the
    //    compass point from the bearing target instead. Its vocabulary goes
    //    into the summary so the code column stays interpretable.
    Ok(TrainOutput {
        ingest,
        model: StormModel {
            classifier,
            regressor,
            event_encoder,
        },
        classifier_eval,
        regressor_eval,
        regressor_rows: target_rows.len(),
        direction_labels: direction_encoder.labels().to_vec(),
    })
}

/// Write the three model artifacts into `dir` (created if absent).
pub fn save_models(dir: &Path, model: &StormModel) -> Result<(), AppError> {
    ensure_model_dir(dir)?;
    save_model_file(dir, ArtifactKind::Classifier, &model.classifier)?;
    save_model_file(dir, ArtifactKind::Regressor, &model.regressor)?;
    save_model_file(dir, ArtifactKind::EventEncoder, &model.event_encoder)?;
    Ok(())
}

/// Load the three model artifacts from `dir`.
pub fn load_models(dir: &Path) -> Result<StormModel, AppError> {
    let classifier = load_model_file(dir, ArtifactKind::Classifier)?;
    let regressor = load_model_file(dir, ArtifactKind::Regressor)?;
    let event_encoder = load_model_file(dir, ArtifactKind::EventEncoder)?;
    Ok(StormModel {
        classifier,
        regressor,
        event_encoder,
    })
}
