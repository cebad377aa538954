//! Reference distribution: every particle sits at the centre.

use bunch_core::types::{FullLocalCoords, GenerationError};

use crate::bunch::{BunchCentre, LocalDistribution};
use crate::rng::BunchRng;

/// Returns the centre coordinates unchanged on every call.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReferenceDistribution;

impl LocalDistribution for ReferenceDistribution {
    fn sample(
        &mut self,
        centre: &BunchCentre,
        _rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        Ok(centre.coords())
    }
}
