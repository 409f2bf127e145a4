//! Mathematical utilities: spherical geometry and least squares.

pub mod geo;
pub mod ols;

pub use geo::*;
pub use ols::*;
