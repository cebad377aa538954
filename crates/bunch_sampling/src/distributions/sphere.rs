//! Isotropic direction from a point.

use bunch_core::types::{FullLocalCoords, GenerationError};

use crate::bunch::{BunchCentre, LocalDistribution};
use crate::rng::BunchRng;

/// Uniform random direction over the full sphere; position, time and energy
/// stay at the centre.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphereDistribution;

impl LocalDistribution for SphereDistribution {
    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let direction = rng.unit_sphere();
        Ok(FullLocalCoords {
            xp: direction.x,
            yp: direction.y,
            zp: direction.z,
            ..centre.coords()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BeamDefinition;
    use crate::distributions::test_centre;

    #[test]
    fn test_directions_cover_both_hemispheres() {
        let centre = test_centre(&BeamDefinition::default());
        let mut rng = BunchRng::from_seed(8);
        let mut backward = 0;
        for _ in 0..1000 {
            let c = SphereDistribution.sample(&centre, &mut rng).unwrap();
            assert!((c.direction_norm_squared() - 1.0).abs() < 1e-12);
            assert_eq!(c.x, centre.x0);
            if c.zp < 0.0 {
                backward += 1;
            }
        }
        assert!((400..600).contains(&backward));
    }
}
