//! Uniform disks in position and direction.

use bunch_core::types::{calculate_zp, ConfigurationError, FullLocalCoords, GenerationError};
use bunch_core::units::C_LIGHT;

use super::check_non_negative;
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// Uniform areal density in a disk of radius `envelope_r` for position and
/// `envelope_rp` for direction, with independent phases.
///
/// `r = envelope_r √u` gives a flat density per unit area. The longitudinal
/// position follows the time offset through `z = z0 + c·Δt`.
#[derive(Clone, Debug, PartialEq)]
pub struct CircleDistribution {
    envelope_r: f64,
    envelope_rp: f64,
    envelope_t: f64,
    envelope_e: f64,
}

impl CircleDistribution {
    /// Reads the radii and longitudinal envelopes.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            envelope_r: definition.envelope_r,
            envelope_rp: definition.envelope_rp,
            envelope_t: definition.envelope_t,
            envelope_e: definition.envelope_e,
        }
    }
}

impl LocalDistribution for CircleDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("envelope_r", self.envelope_r)?;
        check_non_negative("envelope_rp", self.envelope_rp)?;
        check_non_negative("envelope_t", self.envelope_t)?;
        check_non_negative("envelope_e", self.envelope_e)
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let r = self.envelope_r * rng.gen_uniform().sqrt();
        let phi = rng.gen_phase();
        let rp = self.envelope_rp * rng.gen_uniform().sqrt();
        let psi = rng.gen_phase();

        let x = centre.x0 + r * phi.cos();
        let y = centre.y0 + r * phi.sin();
        let xp = centre.xp0 + rp * psi.cos();
        let yp = centre.yp0 + rp * psi.sin();
        let zp = calculate_zp(xp, yp, centre.zp0)?;
        let dt = self.envelope_t * rng.gen_symmetric();
        let z = centre.z0 + C_LIGHT * dt;

        Ok(FullLocalCoords {
            x,
            y,
            z,
            xp,
            yp,
            zp,
            t: centre.t0 + dt,
            s: centre.s_at(z),
            total_energy: centre.e0 * (1.0 + self.envelope_e * rng.gen_symmetric()),
            weight: 1.0,
        })
    }
}
