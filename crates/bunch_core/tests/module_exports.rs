//! Integration tests for module exports.
//!
//! Verifies that the public modules and types are reachable via absolute paths.

use approx::assert_relative_eq;

/// Coordinate and particle types are accessible via absolute path.
#[test]
fn test_types_module_exports() {
    use bunch_core::types::{
        calculate_zp, FullLocalCoords, ParticleDefinition, ParticleSpecies, ReferenceParticle,
    };

    let coords = FullLocalCoords::default();
    assert_eq!(coords.weight, 1.0);

    let particle = ParticleDefinition::from_momentum(ParticleSpecies::ELECTRON, 1.0).unwrap();
    assert_relative_eq!(particle.momentum(), 1.0, epsilon = 1e-12);
    assert!(calculate_zp(0.1, 0.1, 1.0).is_ok());
}

/// Error taxonomy converts into the umbrella type.
#[test]
fn test_error_module_exports() {
    use bunch_core::types::{BunchError, ConfigurationError, ErrorCategory};

    let err: BunchError = ConfigurationError::UnknownDistribution("banana".to_string()).into();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

/// Beamline query trait works through a trait object.
#[test]
fn test_beamline_module_exports() {
    use bunch_core::beamline::{BeamlineElement, BeamlineQuery, SegmentedBeamline};
    use nalgebra::Isometry3;
    use std::sync::Arc;

    let line = SegmentedBeamline::new(
        vec![
            BeamlineElement::drift("d1", 2.0),
            BeamlineElement::bend("b1", 1.0, 0.05),
        ],
        0.0,
        Isometry3::identity(),
    )
    .unwrap();
    let shared: Arc<dyn BeamlineQuery> = Arc::new(line);
    assert_relative_eq!(shared.s_max(), 3.0, epsilon = 1e-12);
    assert_eq!(shared.frame_at(2.5, 0.0, 0.0).unwrap().element_index, Some(1));
}

/// Math helpers are accessible via absolute path.
#[test]
fn test_math_module_exports() {
    use bunch_core::math::covariance::{ensure_positive_definite, CorrectionStep};
    use bunch_core::math::ellipse::EllipsePerimeterSampler;
    use bunch_core::math::interpolators::{Interpolator, LinearInterpolator};
    use bunch_core::math::statistics::RunningMean;
    use nalgebra::Matrix6;

    let interp = LinearInterpolator::new(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
    assert_relative_eq!(interp.interpolate(0.25).unwrap(), 0.5, epsilon = 1e-15);

    let ellipse = EllipsePerimeterSampler::new(0.0, 1.0).unwrap();
    assert!(ellipse.perimeter() > 6.0);

    let corrected = ensure_positive_definite(Matrix6::identity()).unwrap();
    assert_eq!(corrected.step, CorrectionStep::Unchanged);

    let mut mean = RunningMean::<1>::new();
    mean.push(&[4.0]);
    assert_eq!(mean.mean(), [4.0]);
}

/// Constants are accessible via absolute path.
#[test]
fn test_units_module_exports() {
    use bunch_core::units::{C_LIGHT, LENGTH_SAFETY_LARGE};

    assert_eq!(C_LIGHT, 299_792_458.0);
    assert!(LENGTH_SAFETY_LARGE > 0.0);
}
