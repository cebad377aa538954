//! Distribution tags and composite options.

use std::fmt;
use std::str::FromStr;

use bunch_core::types::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Closed set of distribution types, keyed by the tag in the beam definition.
///
/// Tags are matched case-insensitively.
///
/// # Examples
///
/// ```rust
/// use bunch_sampling::config::DistributionType;
///
/// let kind: DistributionType = "GaussTwiss".parse().unwrap();
/// assert_eq!(kind, DistributionType::GaussTwiss);
/// assert_eq!(kind.as_str(), "gausstwiss");
/// assert!("banana".parse::<DistributionType>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistributionType {
    /// Centre coordinates every call
    Reference,
    /// Uniform in every coordinate
    Box,
    /// Uniform transverse square, longitudinal position tied to time
    Square,
    /// Uniform disks in position and direction
    Circle,
    /// Uniform annulus
    Ring,
    /// Isotropic direction
    Sphere,
    /// Elliptical shell in each transverse phase plane
    EShell,
    /// Uncorrelated Gaussian
    Gauss,
    /// Gaussian with an explicit covariance
    GaussMatrix,
    /// Gaussian from Twiss parameters
    GaussTwiss,
    /// Twiss halo with cuts and weighting
    Halo,
    /// Halo flat in beam sigma
    HaloFlatSigma,
    /// x, y and z from three child distributions
    Composite,
    /// Space, direction and energy from three child distributions
    CompositeSde,
    /// PTC ray file replay
    Ptc,
    /// SixTrack particle file replay
    SixTrack,
    /// Event generator output replay
    EventGenerator,
}

impl DistributionType {
    /// Every type, in declaration order.
    pub const ALL: [DistributionType; 17] = [
        Self::Reference,
        Self::Box,
        Self::Square,
        Self::Circle,
        Self::Ring,
        Self::Sphere,
        Self::EShell,
        Self::Gauss,
        Self::GaussMatrix,
        Self::GaussTwiss,
        Self::Halo,
        Self::HaloFlatSigma,
        Self::Composite,
        Self::CompositeSde,
        Self::Ptc,
        Self::SixTrack,
        Self::EventGenerator,
    ];

    /// Canonical lower-case tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Box => "box",
            Self::Square => "square",
            Self::Circle => "circle",
            Self::Ring => "ring",
            Self::Sphere => "sphere",
            Self::EShell => "eshell",
            Self::Gauss => "gauss",
            Self::GaussMatrix => "gaussmatrix",
            Self::GaussTwiss => "gausstwiss",
            Self::Halo => "halo",
            Self::HaloFlatSigma => "haloflatsigma",
            Self::Composite => "composite",
            Self::CompositeSde => "compositesde",
            Self::Ptc => "ptc",
            Self::SixTrack => "sixtrack",
            Self::EventGenerator => "eventgenerator",
        }
    }

    /// True for the two composite types.
    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite | Self::CompositeSde)
    }

    /// True for types that replay an input file.
    #[inline]
    pub fn is_file_based(&self) -> bool {
        matches!(self, Self::Ptc | Self::SixTrack | Self::EventGenerator)
    }
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| ConfigurationError::UnknownDistribution(s.to_string()))
    }
}

/// Weight policy of composite distributions.
///
/// `First` takes the weight of the first child (x, or space) and ignores the
/// other two. `Product` multiplies all three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeWeight {
    /// Weight of the first child only
    #[default]
    First,
    /// Product of the three child weights
    Product,
}

impl CompositeWeight {
    /// Combines the three child weights.
    #[inline]
    pub fn combine(&self, first: f64, second: f64, third: f64) -> f64 {
        match self {
            Self::First => first,
            Self::Product => first * second * third,
        }
    }
}
