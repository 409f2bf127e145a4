//! K-nearest-neighbors event-type classifier.
//!
//! Stage one of the pipeline: given when and where a storm begins
//! (month, day, hour, latitude, longitude) it votes among the `k`
//! closest training rows for the event type. Features are compared by
//! plain Euclidean distance without scaling, matching how the model was
//! originally tuned; the latitude/longitude axes therefore dominate the
//! calendar axes, which is part of the fitted behavior and not corrected
//! here.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::metrics::{classification_report, ClassificationReport};
use crate::model::split::{select, split_indices};

/// Neighbors consulted per prediction.
pub const N_NEIGHBORS: usize = 5;

/// Classifier feature width: begin month, day, hour, latitude, longitude.
pub const CLASSIFIER_FEATURES: usize = 5;

/// One training row: features plus the event-type label.
pub type LabeledRow = ([f64; CLASSIFIER_FEATURES], String);

/// Evaluation summary from a held-out split.
#[derive(Debug, Clone)]
pub struct ClassifierEvaluation {
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fitted KNN model. Stores the full training set; prediction is a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventClassifier {
    points: Vec<[f64; CLASSIFIER_FEATURES]>,
    labels: Vec<String>,
    k: usize,
}

impl EventClassifier {
    /// Fit with the standard neighbor count.
    pub fn fit(rows: &[LabeledRow]) -> Result<Self, ModelError> {
        Self::fit_with_k(rows, N_NEIGHBORS)
    }

    pub fn fit_with_k(rows: &[LabeledRow], k: usize) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() < k {
            return Err(ModelError::TooFewRows {
                n: rows.len(),
                needed: k,
            });
        }
        Ok(Self {
            points: rows.iter().map(|(features, _)| *features).collect(),
            labels: rows.iter().map(|(_, label)| label.clone()).collect(),
            k,
        })
    }

    /// Predict the event type for one query.
    ///
    /// Neighbors are ranked by (distance, training index), so equidistant
    /// rows resolve to the earlier one. The vote is a plain majority; a tied
    /// vote goes to the label encountered first in neighbor order.
    pub fn predict(&self, features: &[f64; CLASSIFIER_FEATURES]) -> Result<String, ModelError> {
        // A loaded artifact can be structurally empty; treat it as unfitted.
        if self.points.is_empty() || self.k == 0 {
            return Err(ModelError::NotFitted);
        }
        for (i, value) in features.iter().enumerate() {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteFeature(i));
            }
        }

        // Squared distance ranks identically to Euclidean.
        let mut ranked: Vec<(f64, usize)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, point)| (squared_distance(point, features), i))
            .collect();
        ranked.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let mut votes: Vec<(&str, usize)> = Vec::new();
        for &(_, idx) in &ranked[..self.k.min(ranked.len())] {
            let label = self.labels[idx].as_str();
            match votes.iter_mut().find(|(known, _)| *known == label) {
                Some(entry) => entry.1 += 1,
                None => votes.push((label, 1)),
            }
        }

        let mut winner = votes[0];
        for &vote in &votes[1..] {
            if vote.1 > winner.1 {
                winner = vote;
            }
        }
        Ok(winner.0.to_string())
    }

    /// Predict a whole batch in parallel, preserving row order.
    pub fn predict_batch(
        &self,
        rows: &[[f64; CLASSIFIER_FEATURES]],
    ) -> Result<Vec<String>, ModelError> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }

    pub fn training_rows(&self) -> usize {
        self.points.len()
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Score a throwaway model on a seeded held-out split.
    ///
    /// The deployed model is fitted elsewhere on every row; this reports how
    /// such a model generalizes, using the same seed to stay reproducible.
    pub fn evaluate(rows: &[LabeledRow], seed: u64) -> Result<ClassifierEvaluation, ModelError> {
        let split = split_indices(rows.len(), seed);
        let train = select(rows, &split.train);
        let test = select(rows, &split.test);

        let model = Self::fit(&train)?;
        let features: Vec<[f64; CLASSIFIER_FEATURES]> =
            test.iter().map(|(f, _)| *f).collect();
        let predicted = model.predict_batch(&features)?;
        let actual: Vec<String> = test.into_iter().map(|(_, label)| label).collect();

        Ok(ClassifierEvaluation {
            report: classification_report(&actual, &predicted),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }
}

fn squared_distance(a: &[f64; CLASSIFIER_FEATURES], b: &[f64; CLASSIFIER_FEATURES]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}
