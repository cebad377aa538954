//! Error types for structured error handling.
//!
//! This module provides:
//! - `ConfigurationError`: bad or conflicting parameters, detected while configuring
//!   or validating a sampler
//! - `InitialisationError`: missing or malformed input files, detected at initialisation
//! - `GenerationError`: failures while producing particles
//! - `BunchError`: umbrella type with an [`ErrorCategory`] accessor
//! - `InterpolationError`: errors from the numerical interpolation helpers
//!
//! All three classes are fatal to a run. Non-fatal conditions are reported via
//! `tracing::warn!` at the point where they occur.

use thiserror::Error;

/// Broad classification of a [`BunchError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Parameter problems found by `configure` or `validate_parameters`.
    Configuration,
    /// File problems found by `initialise`.
    Initialisation,
    /// Failures while generating particles.
    Generation,
}

/// Configuration errors.
///
/// Raised before any particle is generated, naming the offending parameter
/// and its value wherever there is one.
///
/// # Examples
/// ```
/// use bunch_core::types::ConfigurationError;
///
/// let err = ConfigurationError::ConflictingParameters { keys: vec!["sigma_e", "sigma_p"] };
/// assert!(err.to_string().contains("sigma_e, sigma_p"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// Parameter outside its required domain.
    #[error("Invalid parameter '{name}' = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
        /// Why the value is rejected
        reason: String,
    },

    /// Bounded range with min not below max.
    #[error("Invalid range for '{name}': min {min} must be less than max {max}")]
    InvalidRange {
        /// Parameter family name
        name: &'static str,
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },

    /// More than one member of a mutually exclusive group was set.
    #[error("Conflicting parameters {}: at most one may be set", .keys.join(", "))]
    ConflictingParameters {
        /// Keys that were set together
        keys: Vec<&'static str>,
    },

    /// Distribution tag not recognised.
    #[error("Unknown distribution type: '{0}'")]
    UnknownDistribution(String),

    /// Halo weighting function not recognised.
    #[error("Unknown halo weighting function: '{0}' (expected flat, one, oneoverr, oneoverrsqrd or exp)")]
    UnknownWeightFunction(String),

    /// Particle name or PDG code not recognised.
    #[error("Unknown particle: '{0}'")]
    UnknownParticle(String),

    /// Composite distribution used as a child of another composite.
    #[error("{axis} distribution cannot be composite")]
    NestedComposite {
        /// Axis or dimension name of the offending child
        axis: &'static str,
    },

    /// File format not understood by the file-based distribution.
    #[error("Unsupported distribution file format: '{0}'")]
    UnsupportedFileFormat(String),

    /// File-based distribution configured without a file.
    #[error("Distribution '{distribution}' requires a distribution file")]
    MissingFile {
        /// Distribution tag
        distribution: &'static str,
    },

    /// Batch run asks for more particles than the file provides.
    #[error("File {path} provides {available} particles but {requested} events were requested and looping is disabled")]
    InsufficientFileEntries {
        /// File path
        path: String,
        /// Requested number of events
        requested: usize,
        /// Particles available in the file
        available: usize,
    },
}

/// Initialisation errors from loading input files.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitialisationError {
    /// File does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// File path
        path: String,
    },

    /// File could not be read.
    #[error("Failed to read {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// Underlying I/O message
        message: String,
    },

    /// A line could not be parsed.
    #[error("Malformed line {line} in {path}: {message}")]
    MalformedLine {
        /// File path
        path: String,
        /// 1-based line number
        line: usize,
        /// Parse problem
        message: String,
    },

    /// File contained no usable entries.
    #[error("File {path} contains no particles")]
    EmptyFile {
        /// File path
        path: String,
    },

    /// Every particle in the file was rejected by the filter window.
    #[error("No particles in {path} passed the event generator filter ({rejected} rejected)")]
    NoAcceptedParticles {
        /// File path
        path: String,
        /// Number of rejected candidates
        rejected: usize,
    },
}

/// Errors raised while generating particles.
///
/// # Examples
/// ```
/// use bunch_core::types::GenerationError;
///
/// let err = GenerationError::OutsideBeamline { s: 12.0, s_min: 0.0, s_max: 10.0 };
/// assert!(err.to_string().contains("12"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Replay file reached its end with looping disabled.
    #[error("Reached end of {path} after {entries} particles and looping is disabled")]
    ReplayExhausted {
        /// File path
        path: String,
        /// Number of entries in the file
        entries: usize,
    },

    /// Covariance matrix could not be made positive definite.
    #[error("Covariance matrix is not positive definite after correction: {matrix}")]
    CovarianceNotPositiveDefinite {
        /// Formatted matrix
        matrix: String,
    },

    /// No physical particle within the allowed number of attempts.
    #[error("No valid particle after {tries} attempts: total energy {energy} GeV does not exceed mass {mass} GeV")]
    MaxTriesExceeded {
        /// Attempts made
        tries: usize,
        /// Total energy of the last attempt (GeV)
        energy: f64,
        /// Particle rest mass (GeV)
        mass: f64,
    },

    /// S coordinate too far outside the beamline.
    #[error("S = {s} m lies outside the beamline range [{s_min}, {s_max}] m")]
    OutsideBeamline {
        /// Requested S
        s: f64,
        /// Beamline start
        s_min: f64,
        /// Beamline end
        s_max: f64,
    },

    /// Curvilinear transform requested without a beamline.
    #[error("Curvilinear transform requested but no beamline is available")]
    NoBeamline,

    /// Transverse slopes leave no room for a longitudinal component.
    #[error("Invalid direction: xp = {xp}, yp = {yp} gives xp^2 + yp^2 >= 1")]
    InvalidDirection {
        /// Horizontal slope
        xp: f64,
        /// Vertical slope
        yp: f64,
    },

    /// Direction vector of zero length cannot be normalised.
    #[error("Cannot normalise a zero-length direction vector")]
    DegenerateDirection,

    /// Sampling requested before `initialise`.
    #[error("Distribution '{distribution}' used before initialisation")]
    NotInitialised {
        /// Distribution tag
        distribution: &'static str,
    },
}

/// Interpolation errors.
///
/// # Examples
/// ```
/// use bunch_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(err.to_string().contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Query point outside the table.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// Query point
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Too few knots.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Knots rejected (length mismatch or repeated abscissa).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Umbrella error for the bunch generation API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BunchError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Initialisation error.
    #[error("Initialisation error: {0}")]
    Initialisation(#[from] InitialisationError),

    /// Generation error.
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

impl BunchError {
    /// Returns the taxonomy class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            BunchError::Configuration(_) => ErrorCategory::Configuration,
            BunchError::Initialisation(_) => ErrorCategory::Initialisation,
            BunchError::Generation(_) => ErrorCategory::Generation,
        }
    }
}
