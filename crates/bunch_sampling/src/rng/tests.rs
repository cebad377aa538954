//! Unit tests for the RNG module.
//!
//! Covers seed reproducibility, stream independence, range properties and
//! the moments of the correlated Gaussian generator.

use super::*;
use approx::assert_relative_eq;
use nalgebra::{Matrix6, Vector6};

#[test]
fn test_seed_reproducibility() {
    let mut a = BunchRng::from_seed(12345);
    let mut b = BunchRng::from_seed(12345);
    for _ in 0..100 {
        assert_eq!(a.gen_uniform(), b.gen_uniform());
        assert_eq!(a.gen_normal(), b.gen_normal());
    }
}

#[test]
fn test_stream_zero_matches_seed() {
    let mut a = BunchRng::stream(99, 0);
    let mut b = BunchRng::from_seed(99);
    assert_eq!(a.gen_uniform(), b.gen_uniform());

    let mut c = BunchRng::stream(99, 1);
    let mut d = BunchRng::stream(99, 2);
    assert_ne!(c.seed(), d.seed());
    assert_ne!(c.gen_uniform(), d.gen_uniform());
}

#[test]
fn test_normal_moments() {
    let mut rng = BunchRng::from_seed(42);
    let n = 100_000;
    let values: Vec<f64> = (0..n).map(|_| rng.gen_normal()).collect();
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    assert!(mean.abs() < 0.02, "mean {mean}");
    assert!((var - 1.0).abs() < 0.02, "variance {var}");
}

#[test]
fn test_multi_gaussian_reproduces_covariance() {
    let mut cov = Matrix6::from_diagonal(&Vector6::new(4.0, 1.0, 2.0, 1.0, 1.0, 0.25));
    cov[(0, 1)] = 1.2;
    cov[(1, 0)] = 1.2;
    let gen = MultiGaussian::new(Vector6::zeros(), cov).unwrap();
    let mut rng = BunchRng::from_seed(7);

    let n = 200_000;
    let mut sum_xx = 0.0;
    let mut sum_xxp = 0.0;
    let mut sum_dd = 0.0;
    for _ in 0..n {
        let v = gen.sample(&mut rng);
        sum_xx += v[0] * v[0];
        sum_xxp += v[0] * v[1];
        sum_dd += v[5] * v[5];
    }
    assert_relative_eq!(sum_xx / n as f64, 4.0, max_relative = 0.02);
    assert_relative_eq!(sum_xxp / n as f64, 1.2, max_relative = 0.03);
    assert_relative_eq!(sum_dd / n as f64, 0.25, max_relative = 0.02);
}

#[test]
fn test_multi_gaussian_corrects_zero_diagonal() {
    let cov = Matrix6::from_diagonal(&Vector6::new(1e-6, 1e-8, 1e-6, 1e-8, 0.0, 1e-6));
    let gen = MultiGaussian::new(Vector6::zeros(), cov).unwrap();
    assert_ne!(
        gen.correction(),
        bunch_core::math::covariance::CorrectionStep::Unchanged
    );
    let mut rng = BunchRng::from_seed(3);
    let v = gen.sample(&mut rng);
    assert!(v[4].abs() < 1e-20);
}

#[test]
fn test_multi_gaussian_rejects_zero_matrix() {
    assert!(MultiGaussian::new(Vector6::zeros(), Matrix6::zeros()).is_err());
}

use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Symmetric draws stay in (−1, 1] for any seed.
    #[test]
    fn prop_symmetric_in_range(seed in any::<u64>()) {
        let mut rng = BunchRng::from_seed(seed);
        for _ in 0..1000 {
            let v = rng.gen_symmetric();
            prop_assert!(v > -1.0 && v <= 1.0, "symmetric value {} (seed={})", v, seed);
        }
    }

    /// Unit-sphere draws have unit norm for any seed.
    #[test]
    fn prop_unit_sphere_normalised(seed in any::<u64>()) {
        let mut rng = BunchRng::from_seed(seed);
        for _ in 0..100 {
            let d = rng.unit_sphere();
            prop_assert!((d.norm() - 1.0).abs() < 1e-12);
        }
    }
}
