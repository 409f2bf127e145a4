//! Least squares solver.
//!
//! The outcome model solves one small regression per target over a shared
//! design matrix:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD rather than QR: the design matrix is tall (rows ≫ 7 columns) and can
//!   be rank-deficient (e.g. a single event type makes the type-code column
//!   constant, collinear with the intercept). SVD still returns the
//!   minimum-norm solution in that case.
//! - With only 7 columns the SVD cost is negligible next to the row count.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
