//! Numerical helpers shared by the samplers.
//!
//! - [`interpolators`]: piecewise linear interpolation
//! - [`ellipse`]: perimeter-uniform points on a Courant–Snyder ellipse
//! - [`covariance`]: positive-definiteness checks and the epsilon correction ladder
//! - [`statistics`]: one-pass running mean

pub mod covariance;
pub mod ellipse;
pub mod interpolators;
pub mod statistics;
