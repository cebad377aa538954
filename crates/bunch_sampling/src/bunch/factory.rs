//! One-call construction of samplers and one-turn maps.

use std::sync::Arc;

use bunch_core::beamline::BeamlineQuery;
use bunch_core::types::{BunchError, ReferenceParticle};
use nalgebra::Isometry3;
use tracing::info;

use super::{BeamlineHandle, PhaseSpaceSampler};
use crate::config::{BeamDefinition, DistributionType};
use crate::one_turn_map::{OneTurnMap, OneTurnMapTable};
use crate::rng::BunchRng;

/// Builds fully initialised samplers.
///
/// Holds everything a sampler needs besides the beam definition: the
/// beamline placement, its start S, the beamline handle and the seed.
///
/// # Example
///
/// ```rust
/// use bunch_core::types::{ParticleDefinition, ParticleSpecies};
/// use bunch_sampling::bunch::SamplerFactory;
/// use bunch_sampling::config::BeamDefinition;
///
/// let electron = ParticleDefinition::from_total_energy(ParticleSpecies::ELECTRON, 1.0).unwrap();
/// let beam = BeamDefinition { distr_type: "composite".to_string(), ..BeamDefinition::default() };
/// assert!(SamplerFactory::new().build(&electron, &beam).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct SamplerFactory {
    beamline_transform: Isometry3<f64>,
    beamline_s: f64,
    beamline: BeamlineHandle,
    seed: u64,
}

impl Default for SamplerFactory {
    fn default() -> Self {
        Self {
            beamline_transform: Isometry3::identity(),
            beamline_s: 0.0,
            beamline: BeamlineHandle::None,
            seed: 0,
        }
    }
}

impl SamplerFactory {
    /// Identity placement, no beamline, seed 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Global placement of the beamline start.
    pub fn with_beamline_transform(mut self, transform: Isometry3<f64>) -> Self {
        self.beamline_transform = transform;
        self
    }

    /// Path length at the beamline start (m).
    pub fn with_beamline_s(mut self, s: f64) -> Self {
        self.beamline_s = s;
        self
    }

    /// Beamline available now.
    pub fn with_beamline(mut self, beamline: Arc<dyn BeamlineQuery>) -> Self {
        self.beamline = BeamlineHandle::resolved(beamline);
        self
    }

    /// Beamline looked up on first curvilinear use.
    pub fn with_deferred_beamline<F>(mut self, resolver: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn BeamlineQuery>> + Send + Sync + 'static,
    {
        self.beamline = BeamlineHandle::deferred(resolver);
        self
    }

    /// Seed of stream 0.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seed of stream 0.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Parses the tag, then configures, validates and initialises a sampler
    /// on stream 0.
    ///
    /// # Errors
    ///
    /// The first configuration, validation or initialisation failure.
    pub fn build<R: ReferenceParticle + ?Sized>(
        &self,
        reference: &R,
        definition: &BeamDefinition,
    ) -> Result<PhaseSpaceSampler, BunchError> {
        self.build_stream(reference, definition, 0)
    }

    /// As [`build`](Self::build) on random stream `stream`.
    pub fn build_stream<R: ReferenceParticle + ?Sized>(
        &self,
        reference: &R,
        definition: &BeamDefinition,
        stream: u64,
    ) -> Result<PhaseSpaceSampler, BunchError> {
        let kind: DistributionType = definition.distr_type.parse()?;
        let mut sampler = PhaseSpaceSampler::configure(
            reference,
            definition,
            kind,
            self.beamline_transform,
            self.beamline_s,
            self.beamline.clone(),
            BunchRng::stream(self.seed, stream),
        )?;
        sampler.validate_parameters()?;
        sampler.initialise()?;
        Ok(sampler)
    }

    /// One-turn map named by `one_turn_map_file`, if any.
    ///
    /// A bunch starting at `s0 > 0` skips the map on its first turn.
    pub fn build_one_turn_map<R: ReferenceParticle + ?Sized>(
        &self,
        reference: &R,
        definition: &BeamDefinition,
    ) -> Result<Option<OneTurnMap>, BunchError> {
        if definition.one_turn_map_file.is_empty() {
            return Ok(None);
        }
        let table = OneTurnMapTable::from_file(&definition.one_turn_map_file)?;
        info!(
            path = %definition.one_turn_map_file,
            terms = table.len(),
            "Loaded one-turn map"
        );
        Ok(Some(OneTurnMap::new(
            table,
            reference.momentum(),
            definition.s0 > 0.0,
        )))
    }
}
