//! End-to-end tests from beam definition to global coordinates.
//!
//! # Test Coverage
//!
//! - Box bunch through the flat transform
//! - Straight beamline: curvilinear and flat paths agree
//! - PTC, SixTrack and HepMC3 replay through the factory
//! - Replay exhaustion, looping and batch capacity checks
//! - One-turn map loaded from a beam definition

use std::io::Write;
use std::sync::Arc;

use approx::assert_relative_eq;
use bunch_core::beamline::SegmentedBeamline;
use bunch_core::types::{
    BunchError, ConfigurationError, GenerationError, ParticleDefinition, ParticleSpecies,
    ReferenceParticle,
};
use bunch_core::units::LENGTH_SAFETY_LARGE;
use bunch_sampling::bunch::{LocalDistribution, SamplerFactory, DEFAULT_MAX_TRIES};
use bunch_sampling::config::BeamDefinition;
use nalgebra::Vector3;
use tempfile::NamedTempFile;

fn proton() -> ParticleDefinition {
    ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 6500.0).unwrap()
}

fn fixture(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn path_of(file: &NamedTempFile) -> String {
    file.path().to_string_lossy().into_owned()
}

// ============================================================================
// Analytic bunches
// ============================================================================

#[test]
fn e2e_box_bunch() {
    let beam = BeamDefinition {
        envelope_x: 1e-3,
        envelope_y: 1e-3,
        envelope_xp: 1e-4,
        envelope_yp: 1e-4,
        ..BeamDefinition::of_type("box")
    };
    let mut sampler = SamplerFactory::new().with_seed(21).build(&proton(), &beam).unwrap();
    let bunch = sampler.generate(2_000).unwrap();

    assert_eq!(bunch.len(), 2_000);
    for p in &bunch {
        assert!(p.global.x.abs() <= 1e-3 * (1.0 + 1e-12));
        assert!(p.global.y.abs() <= 1e-3 * (1.0 + 1e-12));
        assert_relative_eq!(p.global.z, -LENGTH_SAFETY_LARGE, epsilon = 1e-15);
        let norm = (p.global.xp.powi(2) + p.global.yp.powi(2) + p.global.zp.powi(2)).sqrt();
        assert_relative_eq!(norm, 1.0, epsilon = 1e-9);
        assert_eq!(p.beamline_index, None);
    }
    assert_eq!(sampler.stats().valid_calls, 2_000);
}

#[test]
fn e2e_straight_beamline_paths_agree() {
    let base = BeamDefinition {
        envelope_x: 2e-3,
        envelope_y: 1e-3,
        envelope_xp: 1e-4,
        envelope_yp: 2e-4,
        ..BeamDefinition::of_type("box")
    };
    let curvilinear_beam = BeamDefinition { s0: 2.0, ..base.clone() };
    let flat_beam = BeamDefinition { z0: 2.0, ..base };

    let curvilinear_factory = SamplerFactory::new()
        .with_seed(5)
        .with_beamline(Arc::new(SegmentedBeamline::straight(10.0)));
    let mut curvilinear = curvilinear_factory.build(&proton(), &curvilinear_beam).unwrap();
    let mut flat = SamplerFactory::new().with_seed(5).build(&proton(), &flat_beam).unwrap();
    assert!(curvilinear.engine().uses_curvilinear());
    assert!(!flat.engine().uses_curvilinear());

    for _ in 0..500 {
        let a = curvilinear.next_valid(DEFAULT_MAX_TRIES).unwrap();
        let b = flat.next_valid(DEFAULT_MAX_TRIES).unwrap();
        assert_relative_eq!(a.global.x, b.global.x, epsilon = 1e-12);
        assert_relative_eq!(a.global.y, b.global.y, epsilon = 1e-12);
        assert_relative_eq!(a.global.z, b.global.z, epsilon = 1e-12);
        assert_relative_eq!(a.global.xp, b.global.xp, epsilon = 1e-12);
        assert_relative_eq!(a.global.yp, b.global.yp, epsilon = 1e-12);
        assert_relative_eq!(a.global.zp, b.global.zp, epsilon = 1e-12);
        assert_relative_eq!(a.local.s, b.local.s, epsilon = 1e-12);
        assert_eq!(a.beamline_index, Some(0));
    }
}

#[test]
fn e2e_deferred_beamline_missing() {
    let beam = BeamDefinition {
        s0: 1.0,
        ..BeamDefinition::of_type("reference")
    };
    let mut sampler = SamplerFactory::new()
        .with_deferred_beamline(|| None)
        .build(&proton(), &beam)
        .unwrap();
    assert_eq!(
        sampler.next_valid(DEFAULT_MAX_TRIES).unwrap_err(),
        GenerationError::NoBeamline
    );
}

// ============================================================================
// File replay
// ============================================================================

const PTC_RAYS: &str = "\
! generated rays
ptc_start, x=1.0e-3, px=1.0e-5, y=0.0, py=0.0, t=0.0, pt=0.0;
ptc_start, x=2.0e-3, px=0.0, y=-1.0e-3, py=2.0e-5, t=0.3, pt=1.0e-3;
ptc_start, x=3.0e-3, px=0.0, y=0.0, py=0.0, t=0.0, pt=-1.0e-3;
";

fn ptc_beam(file: &NamedTempFile) -> BeamDefinition {
    BeamDefinition {
        distr_file: path_of(file),
        ..BeamDefinition::of_type("ptc")
    }
}

#[test]
fn e2e_ptc_replay_then_exhausted() {
    let file = fixture(PTC_RAYS);
    let mut sampler = SamplerFactory::new().build(&proton(), &ptc_beam(&file)).unwrap();

    let xs: Vec<f64> = (0..3).map(|_| sampler.next_local().unwrap().x).collect();
    assert_eq!(xs, vec![1.0e-3, 2.0e-3, 3.0e-3]);
    assert!(matches!(
        sampler.next_local().unwrap_err(),
        GenerationError::ReplayExhausted { entries: 3, .. }
    ));
}

#[test]
fn e2e_ptc_looping_wraps() {
    let file = fixture(PTC_RAYS);
    let beam = BeamDefinition {
        distr_file_loop: true,
        ..ptc_beam(&file)
    };
    let mut sampler = SamplerFactory::new().build(&proton(), &beam).unwrap();
    let first = sampler.next_local().unwrap();
    sampler.next_local().unwrap();
    sampler.next_local().unwrap();
    assert_eq!(sampler.next_local().unwrap(), first);
}

#[test]
fn e2e_ptc_batch_needs_enough_rays() {
    let file = fixture(PTC_RAYS);
    let mut sampler = SamplerFactory::new().build(&proton(), &ptc_beam(&file)).unwrap();
    let err = sampler.begin_of_run(5, true).unwrap_err();
    assert!(matches!(
        err,
        BunchError::Configuration(ConfigurationError::InsufficientFileEntries {
            requested: 5,
            available: 3,
            ..
        })
    ));
    // Interactive runs loop instead.
    sampler.begin_of_run(5, false).unwrap();
    assert_eq!(sampler.generate(5).unwrap().len(), 5);
}

#[test]
fn e2e_ptc_match_length() {
    let file = fixture(PTC_RAYS);
    let beam = BeamDefinition {
        distr_file_match_length: true,
        ..ptc_beam(&file)
    };
    let sampler = SamplerFactory::new().build(&proton(), &beam).unwrap();
    assert_eq!(sampler.suggested_number_of_events(), Some(3));
}

#[test]
fn e2e_ptc_missing_file() {
    let beam = BeamDefinition {
        distr_file: "/nonexistent/rays.ptc".to_string(),
        ..BeamDefinition::of_type("ptc")
    };
    let err = SamplerFactory::new().build(&proton(), &beam).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/rays.ptc"));
}

#[test]
fn e2e_sixtrack_replay() {
    let file = fixture(
        "# id turn s x xp y yp dE/E type turns\n\
         1 1 0.25 1.0 0.1 -2.0 0.0 1e-4 2212 1\n\
         2 1 0.50 0.0 0.0 0.0 0.0 0.0 2212 1\n",
    );
    let beam = BeamDefinition {
        distr_file: path_of(&file),
        z0: 1.0,
        ..BeamDefinition::of_type("sixtrack")
    };
    let mut sampler = SamplerFactory::new().build(&proton(), &beam).unwrap();
    let c = sampler.next_local().unwrap();
    assert_relative_eq!(c.x, 1e-3, epsilon = 1e-15);
    assert_relative_eq!(c.y, -2e-3, epsilon = 1e-15);
    assert_relative_eq!(c.z, 1.25, epsilon = 1e-15);
    assert_relative_eq!(c.total_energy, 6500.0 * (1.0 + 1e-4), max_relative = 1e-12);
    assert_eq!(sampler.current_species(), ParticleSpecies::PROTON);
    // First row matches the reference particle.
    assert!(!sampler.particle_definition_updated());
}

#[test]
fn e2e_sixtrack_species_change_survives_rejection() {
    let file = fixture(
        "1 1 0.0 0.0 0.0 0.0 0.0 0.0 2212 1\n\
         2 1 0.0 0.0 0.0 0.0 0.0 -1.0 11 1\n\
         3 1 0.0 0.0 0.0 0.0 0.0 0.0 11 1\n",
    );
    let beam = BeamDefinition {
        distr_file: path_of(&file),
        ..BeamDefinition::of_type("sixtrack")
    };
    let mut sampler = SamplerFactory::new().build(&proton(), &beam).unwrap();

    sampler.next_valid(DEFAULT_MAX_TRIES).unwrap();
    assert!(!sampler.particle_definition_updated());

    // The electron row with zero energy is rejected; the next electron is kept.
    sampler.next_valid(DEFAULT_MAX_TRIES).unwrap();
    assert!(sampler.particle_definition_updated());
    assert_eq!(sampler.current_species(), ParticleSpecies::ELECTRON);
    let stats = sampler.stats();
    assert_eq!(stats.local_calls, 3);
    assert_eq!(stats.valid_calls, 2);
    assert_eq!(stats.rejected_below_mass, 1);
}

const HEPMC: &str = "\
HepMC::Version 3.02.05
HepMC::Asciiv3-START_EVENT_LISTING
E 0 1 3
U GEV MM
P 1 0 2212 0.0 0.0 100.0 100.0044 0.938272 1
P 2 0 11 0.0 0.1 10.0 10.0005 0.000511 1
P 3 0 2212 0.0 0.0 50.0 50.0088 0.938272 2
E 1 1 1 @ 1.0 2.0 0.0 0.0
U GEV MM
P 1 0 2212 1.0 0.0 200.0 200.0047 0.938272 1
HepMC::Asciiv3-END_EVENT_LISTING
";

#[test]
fn e2e_event_generator_species_updates() {
    let file = fixture(HEPMC);
    let beam = BeamDefinition {
        distr_file: path_of(&file),
        distr_file_format: "hepmc3".to_string(),
        eventgenerator_particles: "2212, 11".to_string(),
        ..BeamDefinition::of_type("eventgenerator")
    };
    let mut sampler = SamplerFactory::new().build(&proton(), &beam).unwrap();
    assert_eq!(sampler.distribution().file_entries(), Some(3));

    let first = sampler.next_local().unwrap();
    assert!(!sampler.particle_definition_updated());
    assert_eq!(sampler.current_species(), ParticleSpecies::PROTON);
    assert_relative_eq!(first.total_energy, 100.0044, max_relative = 1e-12);

    sampler.next_local().unwrap();
    assert!(sampler.particle_definition_updated());
    assert_eq!(sampler.current_species(), ParticleSpecies::ELECTRON);

    let third = sampler.next_local().unwrap();
    assert!(sampler.particle_definition_updated());
    assert_relative_eq!(third.x, 1e-3, epsilon = 1e-15);
    assert_relative_eq!(third.y, 2e-3, epsilon = 1e-15);
    let direction = Vector3::new(third.xp, third.yp, third.zp);
    assert_relative_eq!(direction.norm(), 1.0, epsilon = 1e-12);
}

#[test]
fn e2e_event_generator_filter_rejects_everything() {
    let file = fixture(HEPMC);
    let beam = BeamDefinition {
        distr_file: path_of(&file),
        eventgenerator_min_ek: 1.0e6,
        ..BeamDefinition::of_type("eventgenerator")
    };
    let err = SamplerFactory::new().build(&proton(), &beam).unwrap_err();
    assert!(matches!(err, BunchError::Initialisation(_)));
}

#[test]
fn e2e_event_generator_bad_format() {
    let file = fixture(HEPMC);
    let beam = BeamDefinition {
        distr_file: path_of(&file),
        distr_file_format: "lhe".to_string(),
        ..BeamDefinition::of_type("eventgenerator")
    };
    let err = SamplerFactory::new().build(&proton(), &beam).unwrap_err();
    assert_eq!(
        err,
        BunchError::Configuration(ConfigurationError::UnsupportedFileFormat("lhe".to_string()))
    );
}

// ============================================================================
// One-turn map
// ============================================================================

const MAP: &str = "\
@ NAME %s \"ONE_TURN_MAP\"
* NAME COEF NV ORDER_DIM ORDER NX NPX NY NPY NDELTAP NT
$ %s %le %d %d %d %d %d %d %d %d %d
  x   0.0  1 5 1 1 0 0 0 0 0
  x   1.0  1 5 1 0 1 0 0 0 0
  px -1.0  2 5 1 1 0 0 0 0 0
  y   1.0  3 5 1 0 0 1 0 0 0
  py  1.0  4 5 1 0 0 0 1 0 0
  d   1.0  5 5 1 0 0 0 0 1 0
";

#[test]
fn e2e_one_turn_map_is_idempotent_per_turn() {
    let file = fixture(MAP);
    let beam = BeamDefinition {
        one_turn_map_file: path_of(&file),
        ..BeamDefinition::of_type("reference")
    };
    let reference = proton();
    let mut map = SamplerFactory::new()
        .build_one_turn_map(&reference, &beam)
        .unwrap()
        .unwrap();
    assert_eq!(map.table().len(), 6);

    map.set_initial_primary_coordinates(1e-3, 0.0, Vector3::z(), reference.momentum());
    let once = map.get_this_turn(2);
    let twice = map.get_this_turn(2);
    assert_eq!(once, twice);
    assert_eq!(map.last_turn(), 2);
    assert_relative_eq!(once.x, 0.0, epsilon = 1e-15);
    assert_relative_eq!(once.px, -1e-3 * reference.momentum(), max_relative = 1e-12);

    let later = map.get_this_turn(3);
    assert_relative_eq!(later.x, -1e-3, epsilon = 1e-15);
    assert_relative_eq!(later.px, 0.0, epsilon = 1e-12);
}

#[test]
fn e2e_no_map_without_file() {
    let map = SamplerFactory::new()
        .build_one_turn_map(&proton(), &BeamDefinition::default())
        .unwrap();
    assert!(map.is_none());
}
