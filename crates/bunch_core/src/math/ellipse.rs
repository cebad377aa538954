//! Perimeter-uniform sampling of Courant–Snyder ellipses.
//!
//! A point drawn with a uniform phase angle is *not* uniform along the
//! ellipse perimeter: it bunches up where the ellipse is flat. This module
//! tabulates the arc length of the unit-invariant ellipse at fixed angles,
//! then inverts the table so a uniform fraction of the perimeter maps back to
//! the angle that reaches it.
//!
//! The unit-invariant ellipse for Twiss `(α, β)` is parameterised by
//!
//! ```text
//! x(φ)  =  √β cos φ
//! x'(φ) = −(α cos φ + sin φ) / √β
//! ```
//!
//! so that `γx² + 2αxx' + βx'² = 1` for every φ. The ellipse for invariant
//! `W` is the same curve scaled by `√W`, so one table serves every action.

use std::f64::consts::TAU;

use super::interpolators::{Interpolator, LinearInterpolator};
use crate::types::InterpolationError;

/// Number of fixed angles used to tabulate the perimeter.
pub const DEFAULT_PERIMETER_POINTS: usize = 1000;

/// Inverse arc-length table for one Twiss ellipse.
///
/// # Example
///
/// ```
/// use bunch_core::math::ellipse::EllipsePerimeterSampler;
///
/// let sampler = EllipsePerimeterSampler::new(0.5, 4.0).unwrap();
/// let (x, xp) = sampler.sample(0.3, 2.0e-6);
/// let invariant = sampler.invariant(x, xp);
/// assert!((invariant - 2.0e-6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct EllipsePerimeterSampler {
    alpha: f64,
    beta: f64,
    gamma: f64,
    perimeter: f64,
    /// Cumulative arc length -> phase angle
    inverse: LinearInterpolator<f64>,
}

impl EllipsePerimeterSampler {
    /// Table with [`DEFAULT_PERIMETER_POINTS`] angles.
    ///
    /// # Errors
    ///
    /// Returns [`InterpolationError::InvalidInput`] if `β` is not positive or
    /// either parameter is not finite.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, InterpolationError> {
        Self::with_points(alpha, beta, DEFAULT_PERIMETER_POINTS)
    }

    /// Table with `n_points` equally spaced angles over one turn.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new), plus [`InterpolationError::InsufficientData`]
    /// for fewer than two points.
    pub fn with_points(alpha: f64, beta: f64, n_points: usize) -> Result<Self, InterpolationError> {
        if !(beta > 0.0) || !beta.is_finite() || !alpha.is_finite() {
            return Err(InterpolationError::InvalidInput(format!(
                "ellipse requires finite alpha and positive beta, got alpha = {alpha}, beta = {beta}"
            )));
        }
        if n_points < 2 {
            return Err(InterpolationError::InsufficientData {
                got: n_points,
                need: 2,
            });
        }

        let point = |phi: f64| unit_point(alpha, beta, phi);
        let mut lengths = Vec::with_capacity(n_points + 1);
        let mut angles = Vec::with_capacity(n_points + 1);
        let mut previous = point(0.0);
        let mut total = 0.0;
        lengths.push(0.0);
        angles.push(0.0);
        for k in 1..=n_points {
            let phi = TAU * k as f64 / n_points as f64;
            let current = point(phi);
            total += (current.0 - previous.0).hypot(current.1 - previous.1);
            lengths.push(total);
            angles.push(phi);
            previous = current;
        }

        Ok(Self {
            alpha,
            beta,
            gamma: (1.0 + alpha * alpha) / beta,
            perimeter: total,
            inverse: LinearInterpolator::new(&lengths, &angles)?,
        })
    }

    /// Twiss α.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Twiss β (m).
    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Twiss γ = (1 + α²)/β.
    #[inline]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Tabulated perimeter of the unit-invariant ellipse.
    #[inline]
    pub fn perimeter(&self) -> f64 {
        self.perimeter
    }

    /// Phase angle reached after the fraction `u` of the perimeter.
    ///
    /// `u` is clamped to `[0, 1]`.
    pub fn angle_at(&self, u: f64) -> f64 {
        let target = u.clamp(0.0, 1.0) * self.perimeter;
        self.inverse.interpolate(target).unwrap_or(0.0)
    }

    /// Point at phase `phi` on the ellipse of invariant `action`.
    #[inline]
    pub fn point(&self, phi: f64, action: f64) -> (f64, f64) {
        let (x, xp) = unit_point(self.alpha, self.beta, phi);
        let scale = action.max(0.0).sqrt();
        (scale * x, scale * xp)
    }

    /// Perimeter-uniform point for the uniform draw `u ∈ [0, 1)`.
    #[inline]
    pub fn sample(&self, u: f64, action: f64) -> (f64, f64) {
        self.point(self.angle_at(u), action)
    }

    /// Courant–Snyder invariant `γx² + 2αxx' + βx'²` of a point.
    #[inline]
    pub fn invariant(&self, x: f64, xp: f64) -> f64 {
        courant_snyder_invariant(self.alpha, self.beta, self.gamma, x, xp)
    }

    /// Phase angle in `[0, 2π)` of a point on any ellipse of this family.
    pub fn phase_of(&self, x: f64, xp: f64) -> f64 {
        let cos = x / self.beta.sqrt();
        let sin = -xp * self.beta.sqrt() - self.alpha * cos;
        sin.atan2(cos).rem_euclid(TAU)
    }
}

/// Courant–Snyder invariant `γx² + 2αxx' + βx'²`.
#[inline]
pub fn courant_snyder_invariant(alpha: f64, beta: f64, gamma: f64, x: f64, xp: f64) -> f64 {
    gamma * x * x + 2.0 * alpha * x * xp + beta * xp * xp
}

#[inline]
fn unit_point(alpha: f64, beta: f64, phi: f64) -> (f64, f64) {
    let (sin, cos) = phi.sin_cos();
    let sqrt_beta = beta.sqrt();
    (sqrt_beta * cos, -(alpha * cos + sin) / sqrt_beta)
}
