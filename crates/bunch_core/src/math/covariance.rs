//! Positive-definiteness checks and correction for 6×6 covariance matrices.
//!
//! A covariance with a zero spread in one coordinate (for example no time
//! spread) is only positive semi-definite and has no Cholesky factor. The
//! correction ladder makes such matrices usable:
//!
//! 1. add [`COVARIANCE_EPSILON`] to every zero diagonal entry
//! 2. if still not positive definite, add it to every zero entry
//! 3. otherwise fail with [`GenerationError::CovarianceNotPositiveDefinite`]
//!
//! Each correction that is applied is logged as a warning. A matrix with no
//! non-zero entry at all is rejected outright.

use nalgebra::{Cholesky, Matrix6};
use tracing::warn;

use crate::types::GenerationError;

/// Value added to zero entries by the correction ladder.
pub const COVARIANCE_EPSILON: f64 = 1.0e-50;

/// Which rung of the ladder produced the returned matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionStep {
    /// Matrix was positive definite as given.
    Unchanged,
    /// Zero diagonal entries were nudged.
    ZeroDiagonal,
    /// Every zero entry was nudged.
    AllZeroEntries,
}

/// Positive-definite covariance plus the correction that was applied.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrectedCovariance {
    /// Positive-definite matrix
    pub matrix: Matrix6<f64>,
    /// Correction applied to reach it
    pub step: CorrectionStep,
}

/// Builds a symmetric matrix from an upper triangle, mirroring it below the
/// diagonal. Entries below the diagonal in `entries` are ignored.
pub fn symmetric_from_upper(entries: &[[f64; 6]; 6]) -> Matrix6<f64> {
    Matrix6::from_fn(|i, j| {
        if i <= j {
            entries[i][j]
        } else {
            entries[j][i]
        }
    })
}

/// True if `m` is symmetric and has a Cholesky factor.
pub fn is_positive_definite(m: &Matrix6<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
        && (m - m.transpose()).iter().all(|v| *v == 0.0)
        && Cholesky::new(*m).is_some()
}

/// Applies the correction ladder.
///
/// # Errors
///
/// Returns [`GenerationError::CovarianceNotPositiveDefinite`] if the matrix
/// has no non-zero entry or is still not positive definite after step 2.
///
/// # Example
///
/// ```
/// use bunch_core::math::covariance::{ensure_positive_definite, CorrectionStep};
/// use nalgebra::Matrix6;
///
/// let mut m = Matrix6::identity() * 1e-6;
/// m[(4, 4)] = 0.0;
/// let corrected = ensure_positive_definite(m).unwrap();
/// assert_eq!(corrected.step, CorrectionStep::ZeroDiagonal);
/// ```
pub fn ensure_positive_definite(
    matrix: Matrix6<f64>,
) -> Result<CorrectedCovariance, GenerationError> {
    if matrix.iter().all(|v| *v == 0.0) {
        return Err(GenerationError::CovarianceNotPositiveDefinite {
            matrix: format_matrix(&matrix),
        });
    }
    if is_positive_definite(&matrix) {
        return Ok(CorrectedCovariance {
            matrix,
            step: CorrectionStep::Unchanged,
        });
    }

    let mut corrected = matrix;
    for i in 0..6 {
        if corrected[(i, i)] == 0.0 {
            corrected[(i, i)] = COVARIANCE_EPSILON;
        }
    }
    warn!(
        epsilon = COVARIANCE_EPSILON,
        "Covariance matrix not positive definite; added epsilon to zero diagonal entries"
    );
    if is_positive_definite(&corrected) {
        return Ok(CorrectedCovariance {
            matrix: corrected,
            step: CorrectionStep::ZeroDiagonal,
        });
    }

    corrected.iter_mut().filter(|v| **v == 0.0).for_each(|v| *v = COVARIANCE_EPSILON);
    warn!(
        epsilon = COVARIANCE_EPSILON,
        "Covariance matrix still not positive definite; added epsilon to all zero entries"
    );
    if is_positive_definite(&corrected) {
        return Ok(CorrectedCovariance {
            matrix: corrected,
            step: CorrectionStep::AllZeroEntries,
        });
    }

    Err(GenerationError::CovarianceNotPositiveDefinite {
        matrix: format_matrix(&matrix),
    })
}

fn format_matrix(m: &Matrix6<f64>) -> String {
    let rows: Vec<String> = m
        .row_iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:e}")).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(", "))
}
