//! Local phase-space distributions.
//!
//! Each type reads its parameters from the [`BeamDefinition`] once, checks
//! them in `validate`, and produces one [`FullLocalCoords`] per `sample`
//! call relative to the shared [`BunchCentre`].
//!
//! | Module | Types |
//! |--------|-------|
//! | [`reference`] | centre only |
//! | [`uniform`] | box, square |
//! | [`circle`] | uniform disks |
//! | [`ring`] | uniform annulus |
//! | [`sphere`] | isotropic direction |
//! | [`eshell`] | elliptical shells |
//! | [`gaussian`] | gauss, gaussmatrix, gausstwiss |
//! | [`halo`] | Twiss halo with cuts and weighting |
//! | [`halo_flat_sigma`] | halo flat in beam sigma |
//! | [`composite`] | composite, compositesde |
//!
//! File replay distributions live in [`crate::file`].
//!
//! [`BeamDefinition`]: crate::config::BeamDefinition
//! [`FullLocalCoords`]: bunch_core::types::FullLocalCoords
//! [`BunchCentre`]: crate::bunch::BunchCentre

pub mod circle;
pub mod composite;
pub mod eshell;
pub mod gaussian;
pub mod halo;
pub mod halo_flat_sigma;
pub mod reference;
pub mod ring;
pub mod sphere;
pub mod uniform;

pub use circle::CircleDistribution;
pub use composite::{CompositeDistribution, CompositeSdeDistribution};
pub use eshell::EShellDistribution;
pub use gaussian::{CovarianceSource, GaussianDistribution};
pub use halo::{HaloDistribution, HaloWeight};
pub use halo_flat_sigma::HaloFlatSigmaDistribution;
pub use reference::ReferenceDistribution;
pub use ring::RingDistribution;
pub use sphere::SphereDistribution;
pub use uniform::{BoxDistribution, SquareDistribution};

use bunch_core::types::ConfigurationError;

/// Fails unless `value` is finite and non-negative.
pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter {
            name,
            value,
            reason: "must be finite and non-negative".to_string(),
        })
    }
}

/// Fails unless `value` is finite and strictly positive.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive".to_string(),
        })
    }
}

/// Fails unless `0 ≤ inner < outer`.
pub(crate) fn check_inner_outer(
    name: &'static str,
    inner: f64,
    outer: f64,
) -> Result<(), ConfigurationError> {
    if !(inner >= 0.0) {
        return Err(ConfigurationError::InvalidParameter {
            name,
            value: inner,
            reason: "inner edge must be non-negative".to_string(),
        });
    }
    if !(inner < outer) {
        return Err(ConfigurationError::InvalidRange {
            name,
            min: inner,
            max: outer,
        });
    }
    Ok(())
}

/// Centre for a 10 GeV proton reference.
#[cfg(test)]
pub(crate) fn test_centre(definition: &crate::config::BeamDefinition) -> crate::bunch::BunchCentre {
    use bunch_core::types::{ParticleDefinition, ParticleSpecies};

    let proton = ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 10.0).unwrap();
    crate::bunch::BunchCentre::configure(&proton, definition).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks() {
        assert!(check_non_negative("a", 0.0).is_ok());
        assert!(check_non_negative("a", -1e-9).is_err());
        assert!(check_non_negative("a", f64::NAN).is_err());
        assert!(check_positive("b", 0.0).is_err());
        assert!(check_inner_outer("c", 0.0, f64::INFINITY).is_ok());
        assert!(matches!(
            check_inner_outer("c", 2.0, 2.0),
            Err(ConfigurationError::InvalidRange { name: "c", .. })
        ));
    }
}
