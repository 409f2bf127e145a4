//! The two model stages and their shared evaluation plumbing.
//!
//! - [`knn`]: KNN event-type classifier (stage one)
//! - [`linear`]: multi-target least-squares outcome regressor (stage two)
//! - [`split`]: seeded train/test index split
//! - [`metrics`]: classification and regression scores

pub mod knn;
pub mod linear;
pub mod metrics;
pub mod split;

pub use knn::{ClassifierEvaluation, EventClassifier, LabeledRow, N_NEIGHBORS};
pub use linear::{clamp_outcomes, OutcomeRegressor, RegressorEvaluation, TargetRow};
