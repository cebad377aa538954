//! # Random Number Generation
//!
//! Random primitives consumed by the samplers:
//!
//! - [`BunchRng`]: seeded `StdRng` wrapper with uniform, symmetric, normal
//!   and unit-sphere draws
//! - [`MultiGaussian`]: correlated 6D Gaussian from a mean and covariance
//!
//! Every sampler owns its generator; parallel workers use separate streams.
//!
//! ```rust
//! use bunch_sampling::rng::BunchRng;
//!
//! let mut rng = BunchRng::from_seed(12345);
//! let d = rng.unit_sphere();
//! assert!((d.norm() - 1.0).abs() < 1e-12);
//! ```

mod multivariate;
mod prng;

pub use multivariate::MultiGaussian;
pub use prng::BunchRng;

#[cfg(test)]
mod tests;
