//! Distribution contract, static dispatch enum and the phase-space sampler.

use bunch_core::types::{
    BunchError, ConfigurationError, FullGlobalCoords, FullLocalCoords, GenerationError,
    ParticleDefinition, ParticleSpecies, ReferenceParticle,
};
use nalgebra::Isometry3;
use tracing::{debug, info};

use super::{BeamlineHandle, BunchCentre, BunchTiming, CoordinateTransformEngine};
use crate::config::{BeamDefinition, DistributionType};
use crate::distributions::{
    BoxDistribution, CircleDistribution, CompositeDistribution, CompositeSdeDistribution,
    EShellDistribution, GaussianDistribution, HaloDistribution, HaloFlatSigmaDistribution,
    ReferenceDistribution, RingDistribution, SphereDistribution, SquareDistribution,
};
use crate::file::{EventGeneratorDistribution, PtcDistribution, SixTrackDistribution};
use crate::rng::BunchRng;

/// Attempts per [`PhaseSpaceSampler::next_valid`] call unless told otherwise.
pub const DEFAULT_MAX_TRIES: usize = 100;

/// Per-variant sampling behaviour.
///
/// Only [`sample`](Self::sample) is required; the lifecycle hooks default to
/// doing nothing.
pub trait LocalDistribution {
    /// Domain checks on the configured parameters.
    fn validate(&self) -> Result<(), ConfigurationError> {
        Ok(())
    }

    /// One-time setup after validation, e.g. loading a file.
    fn initialise(&mut self, _centre: &BunchCentre) -> Result<(), BunchError> {
        Ok(())
    }

    /// Called once before `number_of_events` events are generated.
    fn begin_of_run(
        &mut self,
        _centre: &BunchCentre,
        _rng: &mut BunchRng,
        _number_of_events: usize,
        _batch_mode: bool,
    ) -> Result<(), BunchError> {
        Ok(())
    }

    /// One coordinate set relative to `centre`.
    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError>;

    /// Species of the last sample if it differs from the one before.
    fn take_species_update(&mut self) -> Option<ParticleSpecies> {
        None
    }

    /// Number of entries of a loaded file, if file based.
    fn file_entries(&self) -> Option<usize> {
        None
    }
}

/// Every distribution variant behind one type.
#[derive(Clone, Debug)]
pub enum Distribution {
    /// Centre only
    Reference(ReferenceDistribution),
    /// Uniform box in all coordinates
    Box(BoxDistribution),
    /// Uniform in transverse coordinates, time and energy
    Square(SquareDistribution),
    /// Uniform disks
    Circle(CircleDistribution),
    /// Uniform annulus
    Ring(RingDistribution),
    /// Isotropic direction
    Sphere(SphereDistribution),
    /// Elliptical shells
    EShell(EShellDistribution),
    /// Gaussian family
    Gaussian(GaussianDistribution),
    /// Twiss halo
    Halo(HaloDistribution),
    /// Halo flat in beam sigma
    HaloFlatSigma(HaloFlatSigmaDistribution),
    /// x, y, z children
    Composite(CompositeDistribution),
    /// Space, direction, energy children
    CompositeSde(CompositeSdeDistribution),
    /// PTC ray file
    Ptc(PtcDistribution),
    /// SixTrack particle file
    SixTrack(SixTrackDistribution),
    /// HepMC3 event file
    EventGenerator(EventGeneratorDistribution),
}

macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            Distribution::Reference($inner) => $body,
            Distribution::Box($inner) => $body,
            Distribution::Square($inner) => $body,
            Distribution::Circle($inner) => $body,
            Distribution::Ring($inner) => $body,
            Distribution::Sphere($inner) => $body,
            Distribution::EShell($inner) => $body,
            Distribution::Gaussian($inner) => $body,
            Distribution::Halo($inner) => $body,
            Distribution::HaloFlatSigma($inner) => $body,
            Distribution::Composite($inner) => $body,
            Distribution::CompositeSde($inner) => $body,
            Distribution::Ptc($inner) => $body,
            Distribution::SixTrack($inner) => $body,
            Distribution::EventGenerator($inner) => $body,
        }
    };
}

impl Distribution {
    /// Builds the variant for `kind` from the beam definition.
    ///
    /// # Errors
    ///
    /// Composite variants fail when a child tag is unknown or itself
    /// composite; the event generator fails on an unknown particle name.
    pub fn configure(
        kind: DistributionType,
        definition: &BeamDefinition,
    ) -> Result<Self, ConfigurationError> {
        Ok(match kind {
            DistributionType::Reference => Self::Reference(ReferenceDistribution),
            DistributionType::Box => Self::Box(BoxDistribution::configure(definition)),
            DistributionType::Square => Self::Square(SquareDistribution::configure(definition)),
            DistributionType::Circle => Self::Circle(CircleDistribution::configure(definition)),
            DistributionType::Ring => Self::Ring(RingDistribution::configure(definition)),
            DistributionType::Sphere => Self::Sphere(SphereDistribution),
            DistributionType::EShell => Self::EShell(EShellDistribution::configure(definition)),
            DistributionType::Gauss | DistributionType::GaussMatrix | DistributionType::GaussTwiss => {
                Self::Gaussian(GaussianDistribution::configure(kind, definition))
            }
            DistributionType::Halo => Self::Halo(HaloDistribution::configure(definition)),
            DistributionType::HaloFlatSigma => {
                Self::HaloFlatSigma(HaloFlatSigmaDistribution::configure(definition))
            }
            DistributionType::Composite => {
                Self::Composite(CompositeDistribution::configure(definition)?)
            }
            DistributionType::CompositeSde => {
                Self::CompositeSde(CompositeSdeDistribution::configure(definition)?)
            }
            DistributionType::Ptc => Self::Ptc(PtcDistribution::configure(definition)),
            DistributionType::SixTrack => Self::SixTrack(SixTrackDistribution::configure(definition)),
            DistributionType::EventGenerator => {
                Self::EventGenerator(EventGeneratorDistribution::configure(definition)?)
            }
        })
    }

    /// Tag of this variant.
    pub fn kind(&self) -> DistributionType {
        match self {
            Self::Reference(_) => DistributionType::Reference,
            Self::Box(_) => DistributionType::Box,
            Self::Square(_) => DistributionType::Square,
            Self::Circle(_) => DistributionType::Circle,
            Self::Ring(_) => DistributionType::Ring,
            Self::Sphere(_) => DistributionType::Sphere,
            Self::EShell(_) => DistributionType::EShell,
            Self::Gaussian(g) => g.kind(),
            Self::Halo(_) => DistributionType::Halo,
            Self::HaloFlatSigma(_) => DistributionType::HaloFlatSigma,
            Self::Composite(_) => DistributionType::Composite,
            Self::CompositeSde(_) => DistributionType::CompositeSde,
            Self::Ptc(_) => DistributionType::Ptc,
            Self::SixTrack(_) => DistributionType::SixTrack,
            Self::EventGenerator(_) => DistributionType::EventGenerator,
        }
    }
}

impl LocalDistribution for Distribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        dispatch!(self, d => d.validate())
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        dispatch!(self, d => d.initialise(centre))
    }

    fn begin_of_run(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
        number_of_events: usize,
        batch_mode: bool,
    ) -> Result<(), BunchError> {
        dispatch!(self, d => d.begin_of_run(centre, rng, number_of_events, batch_mode))
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        dispatch!(self, d => d.sample(centre, rng))
    }

    fn take_species_update(&mut self) -> Option<ParticleSpecies> {
        dispatch!(self, d => d.take_species_update())
    }

    fn file_entries(&self) -> Option<usize> {
        dispatch!(self, d => d.file_entries())
    }
}

/// Call counters for the current event.
///
/// Owned by the sampler and reset explicitly with
/// [`PhaseSpaceSampler::reset_event_counters`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Calls to `next_local`
    pub local_calls: usize,
    /// Coordinates accepted by `next_valid`
    pub valid_calls: usize,
    /// Candidates rejected because the energy was below the rest mass
    pub rejected_below_mass: usize,
}

impl GenerationStats {
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A configured distribution together with its centre, transform, timing
/// and random stream.
///
/// # Lifecycle
///
/// 1. [`configure`](Self::configure)
/// 2. [`validate_parameters`](Self::validate_parameters)
/// 3. [`initialise`](Self::initialise)
/// 4. optionally [`begin_of_run`](Self::begin_of_run)
/// 5. [`next_valid`](Self::next_valid) per particle
///
/// [`SamplerFactory`](super::SamplerFactory) performs steps 1 to 3 in one call.
#[derive(Debug)]
pub struct PhaseSpaceSampler {
    kind: DistributionType,
    particle: ParticleDefinition,
    centre: BunchCentre,
    distribution: Distribution,
    engine: CoordinateTransformEngine,
    timing: BunchTiming,
    rng: BunchRng,
    stats: GenerationStats,
    match_file_length: bool,
    particle_updated: bool,
    initialised: bool,
}

impl PhaseSpaceSampler {
    /// Reads every parameter for a `kind` sampler.
    ///
    /// # Errors
    ///
    /// Conflicting energy or spread groups, conflicting timing, or a bad
    /// composite or particle list.
    #[allow(clippy::too_many_arguments)]
    pub fn configure<R: ReferenceParticle + ?Sized>(
        reference: &R,
        definition: &BeamDefinition,
        kind: DistributionType,
        beamline_transform: Isometry3<f64>,
        beamline_s: f64,
        beamline: BeamlineHandle,
        rng: BunchRng,
    ) -> Result<Self, ConfigurationError> {
        let centre = BunchCentre::configure(reference, definition)?;
        let timing = BunchTiming::configure(definition)?;
        let distribution = Distribution::configure(kind, definition)?;
        let engine = CoordinateTransformEngine::new(
            beamline_transform,
            beamline_s,
            centre.s0,
            definition.tilt,
            beamline,
        );
        debug!(distribution = %kind, s0 = centre.s0, e0 = centre.e0, "Configured sampler");

        Ok(Self {
            kind,
            particle: ParticleDefinition::from_reference(reference),
            centre,
            distribution,
            engine,
            timing,
            rng,
            stats: GenerationStats::default(),
            match_file_length: definition.distr_file_match_length,
            particle_updated: false,
            initialised: false,
        })
    }

    /// Domain checks of the distribution parameters.
    pub fn validate_parameters(&self) -> Result<(), ConfigurationError> {
        self.distribution.validate()
    }

    /// One-time setup; must succeed before any particle is generated.
    pub fn initialise(&mut self) -> Result<(), BunchError> {
        self.distribution.initialise(&self.centre)?;
        self.initialised = true;
        info!(distribution = %self.kind, "Initialised sampler");
        Ok(())
    }

    /// Prepares a run of `number_of_events` events.
    ///
    /// In batch mode a file that cannot supply every event fails here;
    /// interactively file looping is switched on instead.
    pub fn begin_of_run(
        &mut self,
        number_of_events: usize,
        batch_mode: bool,
    ) -> Result<(), BunchError> {
        self.distribution.begin_of_run(
            &self.centre,
            &mut self.rng,
            number_of_events,
            batch_mode,
        )
    }

    /// Next local coordinate set.
    ///
    /// # Errors
    ///
    /// [`GenerationError::NotInitialised`] before [`initialise`](Self::initialise),
    /// otherwise whatever the distribution reports.
    pub fn next_local(&mut self) -> Result<FullLocalCoords, GenerationError> {
        if !self.initialised {
            return Err(GenerationError::NotInitialised {
                distribution: self.kind.as_str(),
            });
        }
        self.stats.local_calls += 1;
        let local = self.distribution.sample(&self.centre, &mut self.rng)?;
        self.particle_updated = match self.distribution.take_species_update() {
            Some(species) => {
                debug!(pdg_id = species.pdg_id, "Particle species changed");
                self.particle.update_species(species);
                true
            }
            None => false,
        };
        Ok(local)
    }

    /// Generates and transforms until the total energy exceeds the rest mass
    /// of the current particle.
    ///
    /// # Errors
    ///
    /// [`GenerationError::MaxTriesExceeded`] after `max_tries` rejected
    /// candidates, or any error of generation or transform.
    pub fn next_valid(&mut self, max_tries: usize) -> Result<FullGlobalCoords, GenerationError> {
        let mut last_energy = f64::NAN;
        let mut updated = false;
        for _ in 0..max_tries {
            let local = self.next_local()?;
            // A rejected candidate may still have changed the species.
            updated |= self.particle_updated;
            let mass = self.particle.mass();
            if local.total_energy > mass {
                self.particle_updated = updated;
                self.stats.valid_calls += 1;
                return self.apply_transform(local);
            }
            self.stats.rejected_below_mass += 1;
            last_energy = local.total_energy;
        }
        Err(GenerationError::MaxTriesExceeded {
            tries: max_tries,
            energy: last_energy,
            mass: self.particle.mass(),
        })
    }

    /// Tilt, beamline transform and bunch timing.
    pub fn apply_transform(
        &self,
        local: FullLocalCoords,
    ) -> Result<FullGlobalCoords, GenerationError> {
        self.engine.apply_transform(local, &self.timing)
    }

    /// Sets the event index for `n` events from 0 and generates them.
    pub fn generate(&mut self, n: usize) -> Result<Vec<FullGlobalCoords>, GenerationError> {
        (0..n)
            .map(|i| {
                self.set_event_index(i);
                self.next_valid(DEFAULT_MAX_TRIES)
            })
            .collect()
    }

    /// True if the species changed during the last `next_valid`, rejected
    /// candidates included, or during the last `next_local` when called
    /// directly.
    pub fn particle_definition_updated(&self) -> bool {
        self.particle_updated
    }

    /// Species of the particle being generated.
    pub fn current_species(&self) -> ParticleSpecies {
        self.particle.species()
    }

    /// Current particle definition.
    pub fn particle_definition(&self) -> &ParticleDefinition {
        &self.particle
    }

    /// Bunch of the current event.
    pub fn current_bunch_index(&self) -> usize {
        self.timing.bunch_index()
    }

    /// Recomputes the bunch from the event index.
    pub fn set_event_index(&mut self, event_index: usize) {
        self.timing.set_event_index(event_index);
    }

    /// Counters since the last reset.
    pub fn stats(&self) -> GenerationStats {
        self.stats
    }

    /// Starts a new event.
    pub fn reset_event_counters(&mut self) {
        self.stats.reset();
    }

    /// Distribution type.
    pub fn kind(&self) -> DistributionType {
        self.kind
    }

    /// Centre and spreads.
    pub fn centre(&self) -> &BunchCentre {
        &self.centre
    }

    /// Transform engine.
    pub fn engine(&self) -> &CoordinateTransformEngine {
        &self.engine
    }

    /// Distribution.
    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Entry count of the replay file when `distr_file_match_length` is set.
    pub fn suggested_number_of_events(&self) -> Option<usize> {
        if self.match_file_length {
            self.distribution.file_entries()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proton() -> ParticleDefinition {
        ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 10.0).unwrap()
    }

    fn sampler(definition: &BeamDefinition) -> PhaseSpaceSampler {
        let kind = definition.distr_type.parse().unwrap();
        PhaseSpaceSampler::configure(
            &proton(),
            definition,
            kind,
            Isometry3::identity(),
            0.0,
            BeamlineHandle::None,
            BunchRng::from_seed(7),
        )
        .unwrap()
    }

    #[test]
    fn test_every_tag_configures() {
        let def = BeamDefinition {
            x_distr_type: "gauss".to_string(),
            y_distr_type: "gauss".to_string(),
            z_distr_type: "gauss".to_string(),
            space_distr_type: "reference".to_string(),
            direction_distr_type: "sphere".to_string(),
            energy_distr_type: "reference".to_string(),
            ..BeamDefinition::default()
        };
        for kind in DistributionType::ALL {
            let distribution = Distribution::configure(kind, &def).unwrap();
            assert_eq!(distribution.kind(), kind);
        }
    }

    #[test]
    fn test_not_initialised() {
        let mut s = sampler(&BeamDefinition::default());
        assert_eq!(
            s.next_local().unwrap_err(),
            GenerationError::NotInitialised {
                distribution: "reference"
            }
        );
        s.initialise().unwrap();
        assert!(s.next_local().is_ok());
    }

    #[test]
    fn test_energy_below_mass_exhausts_tries() {
        // A near-total energy spread puts about half the candidates below the rest mass.
        let def = BeamDefinition {
            distr_type: "square".to_string(),
            envelope_e: 0.999,
            e0: 1.0,
            ..BeamDefinition::default()
        };
        let mut s = sampler(&def);
        s.initialise().unwrap();
        let mut accepted = 0;
        for _ in 0..200 {
            let g = s.next_valid(DEFAULT_MAX_TRIES).unwrap();
            assert!(g.local.total_energy > ParticleSpecies::PROTON.mass);
            accepted += 1;
        }
        let stats = s.stats();
        assert_eq!(stats.valid_calls, accepted);
        assert_eq!(stats.local_calls, stats.valid_calls + stats.rejected_below_mass);
        assert!(stats.rejected_below_mass > 0);

        assert!(matches!(
            s.next_valid(0),
            Err(GenerationError::MaxTriesExceeded { tries: 0, .. })
        ));
        s.reset_event_counters();
        assert_eq!(s.stats(), GenerationStats::default());
    }

    #[test]
    fn test_bunch_timing_applied() {
        let def = BeamDefinition {
            bunch_period: 25e-9,
            ..BeamDefinition::default()
        };
        let mut s = sampler(&def);
        s.initialise().unwrap();
        let events = s.generate(3).unwrap();
        assert_eq!(s.current_bunch_index(), 2);
        assert!((events[2].global.t - events[0].global.t - 50e-9).abs() < 1e-18);
    }

    #[test]
    fn test_unknown_child_tag_fails_configure() {
        let def = BeamDefinition {
            distr_type: "composite".to_string(),
            x_distr_type: "gauss".to_string(),
            y_distr_type: "banana".to_string(),
            z_distr_type: "gauss".to_string(),
            ..BeamDefinition::default()
        };
        let err = PhaseSpaceSampler::configure(
            &proton(),
            &def,
            DistributionType::Composite,
            Isometry3::identity(),
            0.0,
            BeamlineHandle::None,
            BunchRng::from_seed(1),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownDistribution("banana".to_string()));
    }
}
