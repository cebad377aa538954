//! # bunch_core: Foundation Types for Beam Bunch Generation
//!
//! ## Layer 1 (Foundation) Role
//!
//! bunch_core is the bottom layer of the workspace and provides everything the
//! samplers share without knowing about any particular distribution:
//! - Coordinate types in the generator-local and global frames (`types::coords`)
//! - The error taxonomy: configuration, initialisation and generation errors (`types::error`)
//! - The reference particle contract and a concrete particle definition (`types::particle`)
//! - The curvilinear beamline query contract and a segmented reference beamline (`beamline`)
//! - Numerical helpers: interpolation, ellipse perimeter tables, covariance
//!   correction, running means (`math`)
//! - Physical constants and unit conventions (`units`)
//!
//! ## Units
//!
//! Lengths are in metres, slopes are unit-direction components, time is in
//! seconds and energies/momenta are in GeV (GeV/c).
//!
//! ## Usage Examples
//!
//! ```rust
//! use bunch_core::types::{calculate_zp, ParticleDefinition, ParticleSpecies, ReferenceParticle};
//!
//! let proton = ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 10.0).unwrap();
//! assert!(proton.beta() < 1.0);
//!
//! let zp = calculate_zp(0.6, 0.0, 1.0).unwrap();
//! assert!((zp - 0.8).abs() < 1e-12);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod beamline;
pub mod math;
pub mod types;
pub mod units;
