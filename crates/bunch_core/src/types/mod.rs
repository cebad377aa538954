//! Coordinate, particle and error types.
//!
//! This module provides:
//! - `coords`: local, global and combined phase-space coordinate sets
//! - `particle`: the [`ReferenceParticle`] contract, [`ParticleSpecies`] and [`ParticleDefinition`]
//! - `error`: the configuration / initialisation / generation error taxonomy
//!
//! # Re-exports
//!
//! Everything public is re-exported at this level for convenience.

pub mod coords;
pub mod error;
pub mod particle;

pub use coords::{calculate_zp, FullGlobalCoords, FullLocalCoords, GlobalCoords, LocalCoords};
pub use error::{
    BunchError, ConfigurationError, ErrorCategory, GenerationError, InitialisationError,
    InterpolationError,
};
pub use particle::{ParticleDefinition, ParticleSpecies, ReferenceParticle};
