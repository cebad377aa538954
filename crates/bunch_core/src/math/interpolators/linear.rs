//! Piecewise linear interpolation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Piecewise linear interpolator over strictly increasing knots.
///
/// Knots are sorted on construction. Repeated abscissae are rejected since
/// the segment between them has no slope.
///
/// # Example
///
/// ```
/// use bunch_core::math::interpolators::{Interpolator, LinearInterpolator};
///
/// // Inverse lookup: cumulative length -> parameter
/// let lengths: [f64; 3] = [0.0, 0.5, 2.0];
/// let params = [0.0, 1.0, 2.0];
/// let inverse = LinearInterpolator::new(&lengths, &params).unwrap();
/// assert!((inverse.interpolate(1.25).unwrap() - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
}

impl<T: Float> LinearInterpolator<T> {
    /// Builds an interpolator from paired knots.
    ///
    /// # Errors
    ///
    /// - [`InterpolationError::InvalidInput`] if the slices differ in length, a
    ///   knot is not finite, or two abscissae coincide
    /// - [`InterpolationError::InsufficientData`] with fewer than two knots
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 2,
            });
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(InterpolationError::InvalidInput(
                "knots must be finite".to_string(),
            ));
        }

        let mut pairs: Vec<(T, T)> = xs.iter().copied().zip(ys.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if pairs.windows(2).any(|w| w[1].0 <= w[0].0) {
            return Err(InterpolationError::InvalidInput(
                "abscissae must be distinct".to_string(),
            ));
        }

        let (xs, ys) = pairs.into_iter().unzip();
        Ok(Self { xs, ys })
    }

    /// Sorted abscissae.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Ordinates in abscissa order.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Number of knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed interpolator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Index `i` with `xs[i] <= x < xs[i+1]`, clamped to `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: T) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        pos.saturating_sub(1).min(self.xs.len() - 2)
    }
}

impl<T: Float> Interpolator<T> for LinearInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();
        if !(x >= x_min && x <= x_max) {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }

        let i = self.find_segment(x);
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        Ok(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}
