//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and derived storm event rows (`StormRecord`, `DerivedFeatures`)
//! - the fixed outcome-target order (`OutcomeKind`)
//! - prediction inputs and outputs (`EventQuery`, `PredictionResult`)

pub mod types;

pub use types::*;
