//! Elliptical shells in the transverse phase planes.

use bunch_core::types::{calculate_zp, ConfigurationError, FullLocalCoords, GenerationError};

use super::check_non_negative;
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// Points on an elliptical shell in (x, xp) and independently in (y, yp).
///
/// ```text
/// x  = x0  + sin φ (shell_x  + (½ − u) shell_x_width)
/// xp = xp0 + cos φ (shell_xp + (½ − u') shell_xp_width)
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EShellDistribution {
    shell_x: f64,
    shell_xp: f64,
    shell_y: f64,
    shell_yp: f64,
    shell_x_width: f64,
    shell_xp_width: f64,
    shell_y_width: f64,
    shell_yp_width: f64,
}

impl EShellDistribution {
    /// Reads the shell semi-axes and widths.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            shell_x: definition.shell_x,
            shell_xp: definition.shell_xp,
            shell_y: definition.shell_y,
            shell_yp: definition.shell_yp,
            shell_x_width: definition.shell_x_width,
            shell_xp_width: definition.shell_xp_width,
            shell_y_width: definition.shell_y_width,
            shell_yp_width: definition.shell_yp_width,
        }
    }
}

impl LocalDistribution for EShellDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        check_non_negative("shell_x", self.shell_x)?;
        check_non_negative("shell_xp", self.shell_xp)?;
        check_non_negative("shell_y", self.shell_y)?;
        check_non_negative("shell_yp", self.shell_yp)?;
        check_non_negative("shell_x_width", self.shell_x_width)?;
        check_non_negative("shell_xp_width", self.shell_xp_width)?;
        check_non_negative("shell_y_width", self.shell_y_width)?;
        check_non_negative("shell_yp_width", self.shell_yp_width)
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let (sin_x, cos_x) = rng.gen_phase().sin_cos();
        let x = centre.x0 + sin_x * (self.shell_x + (0.5 - rng.gen_uniform()) * self.shell_x_width);
        let xp = centre.xp0
            + cos_x * (self.shell_xp + (0.5 - rng.gen_uniform()) * self.shell_xp_width);

        let (sin_y, cos_y) = rng.gen_phase().sin_cos();
        let y = centre.y0 + sin_y * (self.shell_y + (0.5 - rng.gen_uniform()) * self.shell_y_width);
        let yp = centre.yp0
            + cos_y * (self.shell_yp + (0.5 - rng.gen_uniform()) * self.shell_yp_width);

        let zp = calculate_zp(xp, yp, centre.zp0)?;
        let total_energy = centre.e0 * (1.0 + centre.sigma_e * rng.gen_normal());

        Ok(FullLocalCoords {
            x,
            y,
            z: centre.z0,
            xp,
            yp,
            zp,
            t: centre.t0,
            s: centre.s_at(centre.z0),
            total_energy,
            weight: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::test_centre;

    #[test]
    fn test_thin_shell_on_ellipse() {
        let def = BeamDefinition {
            shell_x: 2e-3,
            shell_xp: 1e-4,
            shell_y: 1e-3,
            shell_yp: 5e-5,
            ..BeamDefinition::default()
        };
        let centre = test_centre(&def);
        let mut dist = EShellDistribution::configure(&def);
        let mut rng = BunchRng::from_seed(9);
        for _ in 0..1000 {
            let c = dist.sample(&centre, &mut rng).unwrap();
            let rx = (c.x / 2e-3).powi(2) + (c.xp / 1e-4).powi(2);
            let ry = (c.y / 1e-3).powi(2) + (c.yp / 5e-5).powi(2);
            assert!((rx - 1.0).abs() < 1e-9);
            assert!((ry - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_negative_width() {
        let def = BeamDefinition {
            shell_yp_width: -1.0,
            ..BeamDefinition::default()
        };
        assert!(EShellDistribution::configure(&def).validate().is_err());
    }
}
