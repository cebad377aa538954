//! Six-dimensional correlated Gaussian draws.

use bunch_core::math::covariance::{ensure_positive_definite, CorrectionStep};
use bunch_core::types::GenerationError;
use nalgebra::{Cholesky, Matrix6, Vector6};

use super::BunchRng;

/// Multivariate normal generator `mean + L·z` with `L` the Cholesky factor
/// of the covariance.
///
/// The covariance passes through the epsilon correction ladder before
/// factorisation.
///
/// # Examples
///
/// ```rust
/// use bunch_sampling::rng::{BunchRng, MultiGaussian};
/// use nalgebra::{Matrix6, Vector6};
///
/// let gen = MultiGaussian::new(Vector6::zeros(), Matrix6::identity()).unwrap();
/// let mut rng = BunchRng::from_seed(1);
/// let v = gen.sample(&mut rng);
/// assert!(v.iter().all(|c| c.is_finite()));
/// ```
#[derive(Clone, Debug)]
pub struct MultiGaussian {
    mean: Vector6<f64>,
    covariance: Matrix6<f64>,
    factor: Matrix6<f64>,
    correction: CorrectionStep,
}

impl MultiGaussian {
    /// Builds the generator.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::CovarianceNotPositiveDefinite`] if the
    /// correction ladder cannot make the matrix positive definite.
    pub fn new(mean: Vector6<f64>, covariance: Matrix6<f64>) -> Result<Self, GenerationError> {
        let corrected = ensure_positive_definite(covariance)?;
        let factor = Cholesky::new(corrected.matrix)
            .ok_or_else(|| GenerationError::CovarianceNotPositiveDefinite {
                matrix: format!("{:?}", corrected.matrix),
            })?
            .unpack();
        Ok(Self {
            mean,
            covariance: corrected.matrix,
            factor,
            correction: corrected.step,
        })
    }

    /// Covariance after correction.
    #[inline]
    pub fn covariance(&self) -> &Matrix6<f64> {
        &self.covariance
    }

    /// Correction that was applied to the supplied covariance.
    #[inline]
    pub fn correction(&self) -> CorrectionStep {
        self.correction
    }

    /// Mean vector.
    #[inline]
    pub fn mean(&self) -> &Vector6<f64> {
        &self.mean
    }

    /// Draws one vector.
    pub fn sample(&self, rng: &mut BunchRng) -> Vector6<f64> {
        let mut z = [0.0; 6];
        rng.fill_normal(&mut z);
        self.mean + self.factor * Vector6::from(z)
    }
}
