//! One-dimensional interpolation.
//!
//! ## Example
//!
//! ```
//! use bunch_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let interp = LinearInterpolator::<f64>::new(&[0.0, 1.0, 3.0], &[0.0, 2.0, 3.0]).unwrap();
//! assert_eq!(interp.domain(), (0.0, 3.0));
//! assert!((interp.interpolate(2.0).unwrap() - 2.5).abs() < 1e-12);
//! ```

mod linear;

pub use linear::LinearInterpolator;

use crate::types::InterpolationError;
use num_traits::Float;

/// Common interface for 1D interpolators.
pub trait Interpolator<T: Float> {
    /// Value at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::OutOfBounds`] outside [`domain`](Self::domain).
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Closed interval on which `interpolate` is defined.
    fn domain(&self) -> (T, T);
}
