//! Statistical and geometric properties of the analytic distributions.
//!
//! Every test goes through [`SamplerFactory`] so configuration, validation
//! and initialisation are exercised together with sampling.
//!
//! # Test Coverage
//!
//! - Envelope bounds for box, square, circle, ring and eshell
//! - Unit direction for every analytic distribution (proptest over seeds)
//! - Halo invariant windows
//! - Covariance correction ladder
//! - Sample-mean offset removal
//! - Composite nesting

use approx::assert_relative_eq;
use bunch_core::math::covariance::CorrectionStep;
use bunch_core::types::{
    BunchError, ConfigurationError, FullLocalCoords, GenerationError, ParticleDefinition,
    ParticleSpecies,
};
use bunch_sampling::bunch::{Distribution, PhaseSpaceSampler, SamplerFactory};
use bunch_sampling::config::BeamDefinition;
use bunch_sampling::distributions::HaloDistribution;
use proptest::prelude::*;

const DRAWS: usize = 10_000;
const EDGE: f64 = 1.0 + 1e-12;

fn proton() -> ParticleDefinition {
    ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 450.0).unwrap()
}

fn sampler(beam: &BeamDefinition, seed: u64) -> PhaseSpaceSampler {
    SamplerFactory::new()
        .with_seed(seed)
        .build(&proton(), beam)
        .unwrap()
}

fn draws(beam: &BeamDefinition, seed: u64, n: usize) -> Vec<FullLocalCoords> {
    let mut s = sampler(beam, seed);
    (0..n).map(|_| s.next_local().unwrap()).collect()
}

fn direction_norm(c: &FullLocalCoords) -> f64 {
    (c.xp * c.xp + c.yp * c.yp + c.zp * c.zp).sqrt()
}

// ============================================================================
// Envelope bounds
// ============================================================================

#[test]
fn test_box_within_envelopes() {
    let beam = BeamDefinition {
        x0: 1e-3,
        envelope_x: 2e-3,
        envelope_y: 1e-3,
        envelope_z: 5e-2,
        envelope_t: 1e-9,
        envelope_e: 1e-3,
        ..BeamDefinition::of_type("box")
    };
    for c in draws(&beam, 1, DRAWS) {
        assert!((c.x - 1e-3).abs() <= 2e-3 * EDGE);
        assert!(c.y.abs() <= 1e-3 * EDGE);
        assert!(c.z.abs() <= 5e-2 * EDGE);
        assert!(c.t.abs() <= 1e-9 * EDGE);
        assert!((c.total_energy / 450.0 - 1.0).abs() <= 1e-3 * EDGE);
    }
}

#[test]
fn test_square_within_envelopes() {
    let beam = BeamDefinition {
        envelope_x: 1e-3,
        envelope_xp: 1e-4,
        envelope_y: 3e-3,
        envelope_yp: 2e-4,
        envelope_t: 1e-10,
        ..BeamDefinition::of_type("square")
    };
    let mut widest = 0.0_f64;
    for c in draws(&beam, 2, DRAWS) {
        assert!(c.x.abs() <= 1e-3 * EDGE);
        assert!(c.xp.abs() <= 1e-4 * EDGE);
        assert!(c.y.abs() <= 3e-3 * EDGE);
        assert!(c.yp.abs() <= 2e-4 * EDGE);
        // Longitudinal position follows the time offset.
        assert_relative_eq!(c.z, c.t * bunch_core::units::C_LIGHT, epsilon = 1e-12);
        widest = widest.max(c.x.abs());
    }
    assert!(widest > 0.9e-3, "envelope never approached: {widest}");
}

#[test]
fn test_circle_within_disks() {
    let beam = BeamDefinition {
        envelope_r: 2e-3,
        envelope_rp: 1e-4,
        ..BeamDefinition::of_type("circle")
    };
    for c in draws(&beam, 3, DRAWS) {
        assert!(c.x.hypot(c.y) <= 2e-3 * EDGE);
        assert!(c.xp.hypot(c.yp) <= 1e-4 * EDGE);
    }
}

#[test]
fn test_ring_within_annulus() {
    let beam = BeamDefinition {
        r_min: 1e-3,
        r_max: 2e-3,
        ..BeamDefinition::of_type("ring")
    };
    for c in draws(&beam, 4, DRAWS) {
        let r = c.x.hypot(c.y);
        assert!(r >= 1e-3 / EDGE && r <= 2e-3 * EDGE, "r = {r}");
    }
}

#[test]
fn test_eshell_within_shell_widths() {
    let (a, b, w) = (2e-3, 1e-4, 2e-4);
    let beam = BeamDefinition {
        shell_x: a,
        shell_xp: b,
        shell_y: a,
        shell_yp: b,
        shell_x_width: w,
        shell_xp_width: w * b / a,
        shell_y_width: w,
        shell_yp_width: w * b / a,
        ..BeamDefinition::of_type("eshell")
    };
    let lo = ((a - w / 2.0) / a).powi(2);
    let hi = ((a + w / 2.0) / a).powi(2);
    for c in draws(&beam, 5, DRAWS) {
        for (u, v) in [(c.x, c.xp), (c.y, c.yp)] {
            let r2 = (u / a).powi(2) + (v / b).powi(2);
            assert!(r2 >= lo / EDGE && r2 <= hi * EDGE, "r2 = {r2}");
        }
    }
}

// ============================================================================
// Unit direction
// ============================================================================

fn analytic_beams() -> Vec<BeamDefinition> {
    vec![
        BeamDefinition::of_type("reference"),
        BeamDefinition {
            envelope_x: 1e-3,
            envelope_xp: 1e-2,
            envelope_yp: 1e-2,
            envelope_zp: 1e-2,
            ..BeamDefinition::of_type("box")
        },
        BeamDefinition {
            envelope_xp: 1e-2,
            envelope_yp: 1e-2,
            ..BeamDefinition::of_type("square")
        },
        BeamDefinition {
            envelope_rp: 1e-2,
            ..BeamDefinition::of_type("circle")
        },
        BeamDefinition {
            r_max: 1e-3,
            ..BeamDefinition::of_type("ring")
        },
        BeamDefinition::of_type("sphere"),
        BeamDefinition {
            shell_xp: 1e-3,
            shell_yp: 1e-3,
            ..BeamDefinition::of_type("eshell")
        },
        BeamDefinition {
            sigma_x: 1e-3,
            sigma_xp: 1e-3,
            sigma_y: 1e-3,
            sigma_yp: 1e-3,
            ..BeamDefinition::of_type("gauss")
        },
        BeamDefinition {
            betx: 10.0,
            bety: 20.0,
            alfx: 1.0,
            alfy: -0.5,
            emitx: 1e-8,
            emity: 2e-8,
            ..BeamDefinition::of_type("gausstwiss")
        },
        BeamDefinition {
            betx: 10.0,
            bety: 10.0,
            emitx: 1e-8,
            emity: 1e-8,
            halo_n_sigma_x_inner: 2.0,
            halo_n_sigma_x_outer: 4.0,
            halo_n_sigma_y_inner: 2.0,
            halo_n_sigma_y_outer: 4.0,
            ..BeamDefinition::of_type("halo")
        },
        BeamDefinition {
            betx: 10.0,
            bety: 10.0,
            emitx: 1e-8,
            emity: 1e-8,
            halo_n_sigma_x_outer: 3.0,
            halo_n_sigma_y_outer: 3.0,
            ..BeamDefinition::of_type("haloflatsigma")
        },
        BeamDefinition {
            envelope_r: 1e-3,
            envelope_rp: 1e-3,
            space_distr_type: "circle".to_string(),
            direction_distr_type: "sphere".to_string(),
            energy_distr_type: "reference".to_string(),
            ..BeamDefinition::of_type("compositesde")
        },
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_direction_is_unit(seed in any::<u64>()) {
        for beam in analytic_beams() {
            for c in draws(&beam, seed, 200) {
                let norm = direction_norm(&c);
                prop_assert!(
                    (norm - 1.0).abs() < 1e-9,
                    "{}: |d| = {}", beam.distr_type, norm
                );
            }
        }
    }

    #[test]
    fn prop_box_position_bounded(seed in any::<u64>(), half in 1e-6..1e-2_f64) {
        let beam = BeamDefinition {
            envelope_x: half,
            envelope_y: half,
            ..BeamDefinition::of_type("box")
        };
        for c in draws(&beam, seed, 100) {
            prop_assert!(c.x.abs() <= half * EDGE);
            prop_assert!(c.y.abs() <= half * EDGE);
        }
    }
}

// ============================================================================
// Halo
// ============================================================================

#[test]
fn test_halo_invariants_inside_window() {
    let beam = BeamDefinition {
        betx: 25.0,
        bety: 40.0,
        alfx: 0.8,
        alfy: -1.2,
        emitx: 5e-9,
        emity: 3e-9,
        halo_n_sigma_x_inner: 3.0,
        halo_n_sigma_x_outer: 6.0,
        halo_n_sigma_y_inner: 3.0,
        halo_n_sigma_y_outer: 6.0,
        ..BeamDefinition::of_type("halo")
    };
    let halo = HaloDistribution::configure(&beam);
    let (x_inner, x_outer) = halo.emittance_window_x();
    let (y_inner, y_outer) = halo.emittance_window_y();
    assert_relative_eq!(x_inner, 5e-9 * 9.0, max_relative = 1e-12);
    assert_relative_eq!(y_outer, 3e-9 * 36.0, max_relative = 1e-12);

    for c in draws(&beam, 8, 5_000) {
        let (wx, wy) = halo.invariants(c.x, c.xp, c.y, c.yp);
        assert!(wx <= x_outer * (1.0 + 1e-9) && wy <= y_outer * (1.0 + 1e-9));
        assert!(
            wx >= x_inner * (1.0 - 1e-9) || wy >= y_inner * (1.0 - 1e-9),
            "inside the core in both planes: {wx} {wy}"
        );
    }
}

#[test]
fn test_halo_unknown_weight_rejected() {
    let beam = BeamDefinition {
        betx: 1.0,
        bety: 1.0,
        emitx: 1e-9,
        emity: 1e-9,
        halo_pdf_type: "cubic".to_string(),
        ..BeamDefinition::of_type("halo")
    };
    let err = SamplerFactory::new().build(&proton(), &beam).unwrap_err();
    assert_eq!(
        err,
        BunchError::Configuration(ConfigurationError::UnknownWeightFunction("cubic".to_string()))
    );
}

// ============================================================================
// Gaussian
// ============================================================================

fn matrix_beam(diagonal: [f64; 6]) -> BeamDefinition {
    let mut matrix = [[0.0; 6]; 6];
    for (i, d) in diagonal.iter().enumerate() {
        matrix[i][i] = *d;
    }
    BeamDefinition {
        sigma_matrix: Some(matrix),
        ..BeamDefinition::of_type("gaussmatrix")
    }
}

#[test]
fn test_zero_diagonal_corrected_on_diagonal_only() {
    let mut beam = matrix_beam([1e-6, 1e-8, 1e-6, 1e-8, 0.0, 0.0]);
    if let Some(m) = beam.sigma_matrix.as_mut() {
        m[0][1] = 5e-8;
    }
    let s = sampler(&beam, 9);
    let Distribution::Gaussian(gauss) = s.distribution() else {
        panic!("expected a Gaussian distribution");
    };
    let generator = gauss.generator().unwrap();
    assert_eq!(generator.correction(), CorrectionStep::ZeroDiagonal);

    let raw = gauss.covariance(s.centre());
    let diff = generator.covariance() - raw;
    for i in 0..6 {
        for j in 0..6 {
            if i != j {
                assert_eq!(diff[(i, j)], 0.0, "off-diagonal ({i}, {j}) changed");
            }
        }
    }
    assert!(diff[(4, 4)] > 0.0 && diff[(5, 5)] > 0.0);
    assert_eq!(diff[(0, 0)], 0.0);
}

#[test]
fn test_all_zero_covariance_fails() {
    let err = SamplerFactory::new()
        .build(&proton(), &matrix_beam([0.0; 6]))
        .unwrap_err();
    assert!(matches!(
        err,
        BunchError::Generation(GenerationError::CovarianceNotPositiveDefinite { .. })
    ));
}

#[test]
fn test_sample_mean_offset_removed() {
    const N: usize = 2_000;
    let beam = BeamDefinition {
        x0: 1e-3,
        sigma_x: 1e-3,
        sigma_xp: 1e-4,
        sigma_y: 2e-3,
        sigma_yp: 1e-4,
        sigma_e: 1e-3,
        offset_sample_mean: true,
        ..BeamDefinition::of_type("gauss")
    };
    let mut s = sampler(&beam, 10);
    s.begin_of_run(N, true).unwrap();
    let points: Vec<FullLocalCoords> = (0..N).map(|_| s.next_local().unwrap()).collect();

    let mean = |f: fn(&FullLocalCoords) -> f64| points.iter().map(f).sum::<f64>() / N as f64;
    let tolerance = 1.0 / (N as f64).sqrt();
    assert!((mean(|c| c.x) - 1e-3).abs() < 1e-3 * tolerance);
    assert!(mean(|c| c.y).abs() < 2e-3 * tolerance);
    assert!((mean(|c| c.total_energy) / 450.0 - 1.0).abs() < 1e-3 * tolerance);
}

// ============================================================================
// Composite
// ============================================================================

#[test]
fn test_nested_composite_names_axis() {
    let beam = BeamDefinition {
        x_distr_type: "gauss".to_string(),
        y_distr_type: "composite".to_string(),
        z_distr_type: "reference".to_string(),
        ..BeamDefinition::of_type("composite")
    };
    let err = SamplerFactory::new().build(&proton(), &beam).unwrap_err();
    assert_eq!(
        err,
        BunchError::Configuration(ConfigurationError::NestedComposite { axis: "y" })
    );
    assert!(err.to_string().contains("y distribution cannot be composite"));
}

#[test]
fn test_composite_takes_axes_from_children() {
    let beam = BeamDefinition {
        x_distr_type: "box".to_string(),
        y_distr_type: "reference".to_string(),
        z_distr_type: "reference".to_string(),
        envelope_x: 1e-3,
        envelope_y: 5e-3,
        ..BeamDefinition::of_type("composite")
    };
    let points = draws(&beam, 11, 1_000);
    assert!(points.iter().any(|c| c.x.abs() > 1e-4));
    assert!(points.iter().all(|c| c.y == 0.0));
}
