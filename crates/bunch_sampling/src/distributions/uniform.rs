//! Flat distributions: box and square.

use bunch_core::types::{
    calculate_zp, ConfigurationError, FullLocalCoords, GenerationError,
};
use bunch_core::units::C_LIGHT;
use nalgebra::Vector3;

use super::check_non_negative;
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// Uniform in every coordinate about the centre.
///
/// x, y, z, xp, yp, zp and t are drawn in `centre ± envelope`, the total
/// energy in `E0 (1 ± envelope_e)`. The direction is renormalised to a unit
/// vector afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxDistribution {
    envelope_x: f64,
    envelope_y: f64,
    envelope_z: f64,
    envelope_xp: f64,
    envelope_yp: f64,
    envelope_zp: f64,
    envelope_t: f64,
    envelope_e: f64,
}

impl BoxDistribution {
    /// Reads the envelopes.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            envelope_x: definition.envelope_x,
            envelope_y: definition.envelope_y,
            envelope_z: definition.envelope_z,
            envelope_xp: definition.envelope_xp,
            envelope_yp: definition.envelope_yp,
            envelope_zp: definition.envelope_zp,
            envelope_t: definition.envelope_t,
            envelope_e: definition.envelope_e,
        }
    }
}

impl LocalDistribution for BoxDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("envelope_x", self.envelope_x)?;
        check_non_negative("envelope_y", self.envelope_y)?;
        check_non_negative("envelope_z", self.envelope_z)?;
        check_non_negative("envelope_xp", self.envelope_xp)?;
        check_non_negative("envelope_yp", self.envelope_yp)?;
        check_non_negative("envelope_zp", self.envelope_zp)?;
        check_non_negative("envelope_t", self.envelope_t)?;
        check_non_negative("envelope_e", self.envelope_e)
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let x = centre.x0 + self.envelope_x * rng.gen_symmetric();
        let y = centre.y0 + self.envelope_y * rng.gen_symmetric();
        let z = centre.z0 + self.envelope_z * rng.gen_symmetric();
        let direction = Vector3::new(
            centre.xp0 + self.envelope_xp * rng.gen_symmetric(),
            centre.yp0 + self.envelope_yp * rng.gen_symmetric(),
            centre.zp0 + self.envelope_zp * rng.gen_symmetric(),
        );
        let t = centre.t0 + self.envelope_t * rng.gen_symmetric();
        let total_energy = centre.e0 * (1.0 + self.envelope_e * rng.gen_symmetric());

        let norm = direction.norm();
        if !(norm > 0.0) {
            return Err(GenerationError::DegenerateDirection);
        }
        let direction = direction / norm;

        Ok(FullLocalCoords {
            x,
            y,
            z,
            xp: direction.x,
            yp: direction.y,
            zp: direction.z,
            t,
            s: centre.s_at(z),
            total_energy,
            weight: 1.0,
        })
    }
}

/// Uniform transverse square in position and direction.
///
/// The longitudinal direction is back-derived from xp and yp. The longitudinal
/// position follows the time offset, `z = z0 + c·Δt`, unless `envelope_z` is
/// set, in which case it is drawn independently.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareDistribution {
    envelope_x: f64,
    envelope_y: f64,
    envelope_z: f64,
    envelope_xp: f64,
    envelope_yp: f64,
    envelope_t: f64,
    envelope_e: f64,
}

impl SquareDistribution {
    /// Reads the envelopes.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            envelope_x: definition.envelope_x,
            envelope_y: definition.envelope_y,
            envelope_z: definition.envelope_z,
            envelope_xp: definition.envelope_xp,
            envelope_yp: definition.envelope_yp,
            envelope_t: definition.envelope_t,
            envelope_e: definition.envelope_e,
        }
    }
}

impl LocalDistribution for SquareDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("envelope_x", self.envelope_x)?;
        check_non_negative("envelope_y", self.envelope_y)?;
        check_non_negative("envelope_z", self.envelope_z)?;
        check_non_negative("envelope_xp", self.envelope_xp)?;
        check_non_negative("envelope_yp", self.envelope_yp)?;
        check_non_negative("envelope_t", self.envelope_t)?;
        check_non_negative("envelope_e", self.envelope_e)
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let x = centre.x0 + self.envelope_x * rng.gen_symmetric();
        let y = centre.y0 + self.envelope_y * rng.gen_symmetric();
        let xp = centre.xp0 + self.envelope_xp * rng.gen_symmetric();
        let yp = centre.yp0 + self.envelope_yp * rng.gen_symmetric();
        let zp = calculate_zp(xp, yp, centre.zp0)?;
        let dt = self.envelope_t * rng.gen_symmetric();
        let z = if self.envelope_z > 0.0 {
            centre.z0 + self.envelope_z * rng.gen_symmetric()
        } else {
            centre.z0 + C_LIGHT * dt
        };
        let total_energy = centre.e0 * (1.0 + self.envelope_e * rng.gen_symmetric());

        Ok(FullLocalCoords {
            x,
            y,
            z,
            xp,
            yp,
            zp,
            t: centre.t0 + dt,
            s: centre.s_at(z),
            total_energy,
            weight: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::test_centre;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_zero_envelopes_is_centre() {
        let def = BeamDefinition {
            x0: 1e-3,
            ..BeamDefinition::default()
        };
        let centre = test_centre(&def);
        let mut dist = BoxDistribution::configure(&def);
        let mut rng = BunchRng::from_seed(1);
        let c = dist.sample(&centre, &mut rng).unwrap();
        assert_eq!(c.x, 1e-3);
        assert_eq!(c.zp, 1.0);
        assert_eq!(c.total_energy, centre.e0);
    }

    #[test]
    fn test_box_rejects_negative_envelope() {
        let def = BeamDefinition {
            envelope_zp: -0.1,
            ..BeamDefinition::default()
        };
        let err = BoxDistribution::configure(&def).validate().unwrap_err();
        assert!(err.to_string().contains("envelope_zp"));
    }

    #[test]
    fn test_square_ties_z_to_time() {
        let def = BeamDefinition {
            envelope_t: 1e-9,
            ..BeamDefinition::default()
        };
        let centre = test_centre(&def);
        let mut dist = SquareDistribution::configure(&def);
        let mut rng = BunchRng::from_seed(2);
        for _ in 0..100 {
            let c = dist.sample(&centre, &mut rng).unwrap();
            assert_relative_eq!(c.z, C_LIGHT * (c.t - centre.t0), epsilon = 1e-12);
            assert!(c.t.abs() <= 1e-9);
        }
    }

    #[test]
    fn test_square_independent_z() {
        let def = BeamDefinition {
            envelope_t: 1e-9,
            envelope_z: 1e-3,
            ..BeamDefinition::default()
        };
        let centre = test_centre(&def);
        let mut dist = SquareDistribution::configure(&def);
        let mut rng = BunchRng::from_seed(3);
        for _ in 0..100 {
            let c = dist.sample(&centre, &mut rng).unwrap();
            assert!(c.z.abs() <= 1e-3);
        }
    }
}
