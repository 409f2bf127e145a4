//! Multi-target linear outcome regressor.
//!
//! Stage two of the pipeline: one ordinary-least-squares fit per outcome
//! target, all sharing a design matrix of encoded event type plus the five
//! query features, with an intercept column prepended. Targets are
//! independent, so the per-column solves run in parallel.
//!
//! Raw predictions can go negative; `clamp_outcomes` floors the targets that
//! are counts, dollars, or otherwise non-negative by construction, and leaves
//! coordinates and bearing alone.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::OutcomeKind;
use crate::error::ModelError;
use crate::math::ols::solve_least_squares;
use crate::model::metrics::{mean_squared_error, r2_score};
use crate::model::split::{select, split_indices};

/// Regressor feature width: event-type code plus the five classifier features.
pub const REGRESSOR_FEATURES: usize = 6;

/// One training row: features plus the full target vector.
pub type TargetRow = ([f64; REGRESSOR_FEATURES], [f64; OutcomeKind::COUNT]);

/// Evaluation summary from a held-out split, scored on clamped predictions.
#[derive(Debug, Clone)]
pub struct RegressorEvaluation {
    pub mse: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fitted regressor: one coefficient vector per target, intercept first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeRegressor {
    coefficients: Vec<Vec<f64>>,
}

impl OutcomeRegressor {
    /// Solve the least-squares system for every target.
    ///
    /// Rank-deficient designs (duplicate rows, a single event type making the
    /// code column constant) fall back to the minimum-norm solution inside
    /// the solver, so fitting only fails when a system is ill-conditioned
    /// beyond the solver's tolerance ladder.
    pub fn fit(rows: &[TargetRow]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        let n = rows.len();
        let mut x = DMatrix::zeros(n, REGRESSOR_FEATURES + 1);
        for (r, (features, _)) in rows.iter().enumerate() {
            x[(r, 0)] = 1.0;
            for (c, value) in features.iter().enumerate() {
                x[(r, c + 1)] = *value;
            }
        }

        let coefficients = OutcomeKind::ALL
            .par_iter()
            .map(|kind| {
                let y = DVector::from_iterator(n, rows.iter().map(|(_, t)| t[kind.index()]));
                solve_least_squares(&x, &y)
                    .map(|beta| beta.iter().copied().collect::<Vec<f64>>())
                    .ok_or_else(|| ModelError::Singular(kind.display_name().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { coefficients })
    }

    /// Raw (unclamped) predictions for one feature row, in target order.
    pub fn predict(
        &self,
        features: &[f64; REGRESSOR_FEATURES],
    ) -> Result<[f64; OutcomeKind::COUNT], ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        for (i, value) in features.iter().enumerate() {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteFeature(i));
            }
        }

        let mut out = [0.0; OutcomeKind::COUNT];
        for (slot, beta) in out.iter_mut().zip(&self.coefficients) {
            let mut acc = beta[0];
            for (value, coefficient) in features.iter().zip(&beta[1..]) {
                acc += value * coefficient;
            }
            *slot = acc;
        }
        Ok(out)
    }

    /// A loaded artifact with missing or misshapen coefficients is unusable.
    fn is_fitted(&self) -> bool {
        self.coefficients.len() == OutcomeKind::COUNT
            && self
                .coefficients
                .iter()
                .all(|beta| beta.len() == REGRESSOR_FEATURES + 1)
    }

    /// Score a throwaway model on a seeded held-out split.
    pub fn evaluate(rows: &[TargetRow], seed: u64) -> Result<RegressorEvaluation, ModelError> {
        let split = split_indices(rows.len(), seed);
        let train = select(rows, &split.train);
        let test = select(rows, &split.test);

        let model = Self::fit(&train)?;
        let predicted: Vec<Vec<f64>> = test
            .par_iter()
            .map(|(features, _)| {
                model
                    .predict(features)
                    .map(|raw| clamp_outcomes(raw).to_vec())
            })
            .collect::<Result<Vec<_>, _>>()?;
        let actual: Vec<Vec<f64>> = test
            .iter()
            .map(|(_, targets)| targets.to_vec())
            .collect();

        Ok(RegressorEvaluation {
            mse: mean_squared_error(&actual, &predicted),
            r2: r2_score(&actual, &predicted),
            train_rows: split.train.len(),
            test_rows: split.test.len(),
        })
    }
}

/// Floor the non-negative targets at zero; end coordinates and bearing keep
/// whatever the regression produced.
pub fn clamp_outcomes(raw: [f64; OutcomeKind::COUNT]) -> [f64; OutcomeKind::COUNT] {
    let mut out = raw;
    for kind in OutcomeKind::ALL {
        if kind.clamped_at_zero() && out[kind.index()] < 0.0 {
            out[kind.index()] = 0.0;
        }
    }
    out
}
