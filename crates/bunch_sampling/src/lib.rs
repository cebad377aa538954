//! # bunch_sampling: Phase-Space Samplers for Beam Bunch Generation
//!
//! ## Layer 2 (Kernel) Role
//!
//! bunch_sampling turns a beam definition into particles:
//! - Seeded random streams and a correlated 6D Gaussian (`rng`)
//! - The beam-definition record and distribution tags (`config`)
//! - Analytic samplers: reference, box, square, circle, ring, sphere, energy
//!   shell, Gaussian (diagonal, matrix, Twiss), halo and composites (`distributions`)
//! - File replay of PTC, SixTrack and HepMC3 files (`file`)
//! - The sampler lifecycle, bunch timing and the local-to-global transform (`bunch`)
//! - Polynomial one-turn maps (`one_turn_map`)
//! - Multi-worker batch generation (`parallel`)
//!
//! ## Feature Flags
//!
//! - `parallel` (default): rayon-backed [`parallel::generate_parallel`]
//!
//! ## Usage Examples
//!
//! ```rust
//! use bunch_core::types::{ParticleDefinition, ParticleSpecies};
//! use bunch_sampling::bunch::{SamplerFactory, DEFAULT_MAX_TRIES};
//! use bunch_sampling::config::BeamDefinition;
//!
//! let electron = ParticleDefinition::from_total_energy(ParticleSpecies::ELECTRON, 1.0).unwrap();
//! let beam = BeamDefinition {
//!     sigma_x: 1e-4,
//!     sigma_xp: 1e-5,
//!     sigma_y: 1e-4,
//!     sigma_yp: 1e-5,
//!     ..BeamDefinition::of_type("gauss")
//! };
//!
//! let mut sampler = SamplerFactory::new().with_seed(1).build(&electron, &beam).unwrap();
//! let particle = sampler.next_valid(DEFAULT_MAX_TRIES).unwrap();
//! assert!(particle.local.total_energy > 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod bunch;
pub mod config;
pub mod distributions;
pub mod file;
pub mod one_turn_map;
pub mod parallel;
pub mod rng;
