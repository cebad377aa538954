//! Uniform annulus in the transverse plane.

use bunch_core::types::{ConfigurationError, FullLocalCoords, GenerationError};

use super::check_non_negative;
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// Uniform areal density between `r_min` and `r_max`.
///
/// `r = √(r_min² + (r_max² − r_min²) u)` with a random phase. Direction is the
/// centre direction; time and energy are Gaussian with `sigma_t`, `sigma_e`.
#[derive(Clone, Debug, PartialEq)]
pub struct RingDistribution {
    r_min: f64,
    r_max: f64,
}

impl RingDistribution {
    /// Reads the radii.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            r_min: definition.r_min,
            r_max: definition.r_max,
        }
    }
}

impl LocalDistribution for RingDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("r_min", self.r_min)?;
        if !(self.r_max > self.r_min) || !self.r_max.is_finite() {
            return Err(ConfigurationError::InvalidRange {
                name: "r_min/r_max",
                min: self.r_min,
                max: self.r_max,
            });
        }
        Ok(())
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let r_min2 = self.r_min * self.r_min;
        let r = (r_min2 + (self.r_max * self.r_max - r_min2) * rng.gen_uniform()).sqrt();
        let phi = rng.gen_phase();
        let t = centre.t0 + centre.sigma_t * rng.gen_normal();
        let total_energy = centre.e0 * (1.0 + centre.sigma_e * rng.gen_normal());

        Ok(FullLocalCoords {
            x: centre.x0 + r * phi.cos(),
            y: centre.y0 + r * phi.sin(),
            z: centre.z0,
            xp: centre.xp0,
            yp: centre.yp0,
            zp: centre.zp0,
            t,
            s: centre.s_at(centre.z0),
            total_energy,
            weight: 1.0,
        })
    }
}
