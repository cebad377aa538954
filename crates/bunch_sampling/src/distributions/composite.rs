//! Composites that take each coordinate group from a separate child.
//!
//! | Type | Children |
//! |------|----------|
//! | `composite` | x → (x, xp); y → (y, yp); z → (z, t, E, s) |
//! | `compositesde` | space → (x, y, z, s, t); direction → (xp, yp, zp); energy → E |
//!
//! Children may be any non-composite distribution. The combined weight
//! follows [`CompositeWeight`].

use bunch_core::types::{
    calculate_zp, BunchError, ConfigurationError, FullLocalCoords, GenerationError,
    ParticleSpecies,
};

use crate::bunch::{BunchCentre, Distribution, LocalDistribution};
use crate::config::{BeamDefinition, CompositeWeight, DistributionType};
use crate::rng::BunchRng;

/// Builds one child, refusing composite children.
fn child(
    axis: &'static str,
    tag: &str,
    definition: &BeamDefinition,
) -> Result<Box<Distribution>, ConfigurationError> {
    let kind: DistributionType = tag.parse()?;
    if kind.is_composite() {
        return Err(ConfigurationError::NestedComposite { axis });
    }
    Ok(Box::new(Distribution::configure(kind, definition)?))
}

/// Shared lifecycle forwarding for the three children.
#[derive(Clone, Debug)]
struct Children {
    members: [Box<Distribution>; 3],
}

impl Children {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.members.iter().try_for_each(|c| c.validate())
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        self.members.iter_mut().try_for_each(|c| c.initialise(centre))
    }

    fn begin_of_run(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
        number_of_events: usize,
        batch_mode: bool,
    ) -> Result<(), BunchError> {
        self.members
            .iter_mut()
            .try_for_each(|c| c.begin_of_run(centre, rng, number_of_events, batch_mode))
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<[FullLocalCoords; 3], GenerationError> {
        let [a, b, c] = &mut self.members;
        Ok([
            a.sample(centre, rng)?,
            b.sample(centre, rng)?,
            c.sample(centre, rng)?,
        ])
    }

    fn take_species_update(&mut self) -> Option<ParticleSpecies> {
        // Drain every child so no stale update survives to the next call.
        self.members
            .iter_mut()
            .filter_map(|c| c.take_species_update())
            .fold(None, |first, species| first.or(Some(species)))
    }

    fn file_entries(&self) -> Option<usize> {
        self.members.iter().filter_map(|c| c.file_entries()).min()
    }
}

/// Independent x, y and z children.
#[derive(Clone, Debug)]
pub struct CompositeDistribution {
    children: Children,
    weight: CompositeWeight,
}

impl CompositeDistribution {
    /// Builds the children named by `x_distr_type`, `y_distr_type` and
    /// `z_distr_type`.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::NestedComposite`] naming the offending axis
    /// - [`ConfigurationError::UnknownDistribution`] for an unknown or empty tag
    pub fn configure(definition: &BeamDefinition) -> Result<Self, ConfigurationError> {
        Ok(Self {
            children: Children {
                members: [
                    child("x", &definition.x_distr_type, definition)?,
                    child("y", &definition.y_distr_type, definition)?,
                    child("z", &definition.z_distr_type, definition)?,
                ],
            },
            weight: definition.composite_weight,
        })
    }

    /// Child distribution types in x, y, z order.
    pub fn child_kinds(&self) -> [DistributionType; 3] {
        self.children.members.each_ref().map(|c| c.kind())
    }
}

impl LocalDistribution for CompositeDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.children.validate()
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        self.children.initialise(centre)
    }

    fn begin_of_run(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
        number_of_events: usize,
        batch_mode: bool,
    ) -> Result<(), BunchError> {
        self.children
            .begin_of_run(centre, rng, number_of_events, batch_mode)
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let [x, y, z] = self.children.sample(centre, rng)?;
        Ok(FullLocalCoords {
            x: x.x,
            xp: x.xp,
            y: y.y,
            yp: y.yp,
            z: z.z,
            zp: calculate_zp(x.xp, y.yp, centre.zp0)?,
            t: z.t,
            s: z.s,
            total_energy: z.total_energy,
            weight: self.weight.combine(x.weight, y.weight, z.weight),
        })
    }

    fn take_species_update(&mut self) -> Option<ParticleSpecies> {
        self.children.take_species_update()
    }

    fn file_entries(&self) -> Option<usize> {
        self.children.file_entries()
    }
}

/// Independent space, direction and energy children.
#[derive(Clone, Debug)]
pub struct CompositeSdeDistribution {
    children: Children,
    weight: CompositeWeight,
}

impl CompositeSdeDistribution {
    /// Builds the children named by `space_distr_type`,
    /// `direction_distr_type` and `energy_distr_type`.
    ///
    /// # Errors
    ///
    /// As [`CompositeDistribution::configure`], with axes `space`,
    /// `direction` and `energy`.
    pub fn configure(definition: &BeamDefinition) -> Result<Self, ConfigurationError> {
        Ok(Self {
            children: Children {
                members: [
                    child("space", &definition.space_distr_type, definition)?,
                    child("direction", &definition.direction_distr_type, definition)?,
                    child("energy", &definition.energy_distr_type, definition)?,
                ],
            },
            weight: definition.composite_weight,
        })
    }

    /// Child distribution types in space, direction, energy order.
    pub fn child_kinds(&self) -> [DistributionType; 3] {
        self.children.members.each_ref().map(|c| c.kind())
    }
}

impl LocalDistribution for CompositeSdeDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.children.validate()
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        self.children.initialise(centre)
    }

    fn begin_of_run(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
        number_of_events: usize,
        batch_mode: bool,
    ) -> Result<(), BunchError> {
        self.children
            .begin_of_run(centre, rng, number_of_events, batch_mode)
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let [space, direction, energy] = self.children.sample(centre, rng)?;
        Ok(FullLocalCoords {
            x: space.x,
            y: space.y,
            z: space.z,
            s: space.s,
            t: space.t,
            xp: direction.xp,
            yp: direction.yp,
            zp: direction.zp,
            total_energy: energy.total_energy,
            weight: self
                .weight
                .combine(space.weight, direction.weight, energy.weight),
        })
    }

    fn take_species_update(&mut self) -> Option<ParticleSpecies> {
        self.children.take_species_update()
    }

    fn file_entries(&self) -> Option<usize> {
        self.children.file_entries()
    }
}
