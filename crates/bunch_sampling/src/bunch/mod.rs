//! # Bunch Generation
//!
//! The sampler pipeline from beam definition to global coordinates:
//!
//! - [`BunchCentre`]: centre coordinates and energy spreads
//! - [`LocalDistribution`] / [`Distribution`]: per-variant sampling
//! - [`CoordinateTransformEngine`]: tilt, flat or curvilinear transform
//! - [`BunchTiming`]: bunch index and arrival-time offset
//! - [`PhaseSpaceSampler`]: all of the above plus its own random stream
//! - [`SamplerFactory`]: configure, validate and initialise in one call
//!
//! ```rust
//! use bunch_core::types::{ParticleDefinition, ParticleSpecies};
//! use bunch_sampling::bunch::{SamplerFactory, DEFAULT_MAX_TRIES};
//! use bunch_sampling::config::BeamDefinition;
//!
//! let proton = ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 6500.0).unwrap();
//! let beam = BeamDefinition {
//!     distr_type: "gauss".to_string(),
//!     sigma_x: 1e-4,
//!     sigma_y: 1e-4,
//!     sigma_xp: 1e-6,
//!     sigma_yp: 1e-6,
//!     sigma_e: 1e-4,
//!     ..BeamDefinition::default()
//! };
//! let mut sampler = SamplerFactory::new().with_seed(42).build(&proton, &beam).unwrap();
//! let particle = sampler.next_valid(DEFAULT_MAX_TRIES).unwrap();
//! assert!(particle.local.total_energy > 0.0);
//! ```

mod centre;
mod factory;
mod sampler;
mod timing;
mod transform;

pub use centre::BunchCentre;
pub use factory::SamplerFactory;
pub use sampler::{
    Distribution, GenerationStats, LocalDistribution, PhaseSpaceSampler, DEFAULT_MAX_TRIES,
};
pub use timing::BunchTiming;
pub use transform::{BeamlineHandle, BeamlineResolver, CoordinateTransformEngine};
