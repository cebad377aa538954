//! Run configuration for the `bunch` binary.
//!
//! Loaded from a TOML file, then overridden by `BUNCH_*` environment
//! variables, then by command line flags.
//!
//! ```toml
//! log_level = "info"
//! seed = 42
//!
//! [particle]
//! name = "proton"
//! total_energy = 6500.0
//!
//! [beam]
//! distr_type = "gausstwiss"
//! betx = 0.55
//! bety = 0.55
//! emitx = 5.0e-10
//! emity = 5.0e-10
//!
//! [beamline]
//! elements = [
//!     { name = "d1", length = 10.0 },
//!     { name = "mb", length = 14.3, angle = 0.005 },
//! ]
//! ```

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bunch_core::beamline::{BeamlineElement, BeamlineQuery, SegmentedBeamline};
use bunch_core::types::{ConfigurationError, ParticleDefinition, ParticleSpecies};
use bunch_sampling::bunch::SamplerFactory;
use bunch_sampling::config::BeamDefinition;
use nalgebra::Isometry3;
use serde::Deserialize;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file missing or unreadable.
    #[error("Failed to read config file {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// Underlying error message
        message: String,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// File path
        path: String,
        /// Parser message
        message: String,
    },

    /// Unknown log level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Environment variable with an unparsable value.
    #[error("Environment variable {name} has invalid value '{value}'")]
    InvalidEnv {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// One or more semantic problems.
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Log levels accepted by `log_level`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything
    Trace,
    /// Per-particle detail
    Debug,
    /// Lifecycle events
    #[default]
    Info,
    /// Warnings only
    Warn,
    /// Errors only
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

/// Reference particle section
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Particle name or PDG code, e.g. `"proton"`, `"e-"`, `"2212"`
    pub name: String,
    /// Total energy (GeV)
    pub total_energy: Option<f64>,
    /// Kinetic energy (GeV)
    pub kinetic_energy: Option<f64>,
    /// Momentum (GeV/c)
    pub momentum: Option<f64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            name: "proton".to_string(),
            total_energy: None,
            kinetic_energy: None,
            momentum: None,
        }
    }
}

impl ParticleConfig {
    /// Species named by `name`.
    pub fn species(&self) -> Option<ParticleSpecies> {
        let name = self.name.trim();
        name.parse::<i32>()
            .ok()
            .and_then(ParticleSpecies::from_pdg)
            .or_else(|| ParticleSpecies::from_name(name))
    }

    /// Reference particle from whichever energy key is set.
    ///
    /// # Errors
    ///
    /// Unknown species, no energy key or more than one, or an energy below
    /// the rest mass.
    pub fn definition(&self) -> Result<ParticleDefinition, ConfigurationError> {
        let species = self
            .species()
            .ok_or_else(|| ConfigurationError::UnknownParticle(self.name.clone()))?;
        match (self.total_energy, self.kinetic_energy, self.momentum) {
            (Some(e), None, None) => ParticleDefinition::from_total_energy(species, e),
            (None, Some(ek), None) => ParticleDefinition::from_kinetic_energy(species, ek),
            (None, None, Some(p)) => ParticleDefinition::from_momentum(species, p),
            _ => Err(ConfigurationError::ConflictingParameters {
                keys: self.energy_keys(),
            }),
        }
    }

    fn energy_keys(&self) -> Vec<&'static str> {
        [
            ("particle.total_energy", self.total_energy),
            ("particle.kinetic_energy", self.kinetic_energy),
            ("particle.momentum", self.momentum),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|_| key))
        .collect()
    }
}

/// One beamline element; a non-zero `angle` makes it a bend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ElementConfig {
    /// Element name
    pub name: String,
    /// Arc length (m)
    pub length: f64,
    /// Horizontal bending angle (rad)
    #[serde(default)]
    pub angle: f64,
}

/// Reference beamline section
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BeamlineConfig {
    /// Path length at the first element entrance (m)
    #[serde(default)]
    pub s_start: f64,
    /// Elements in beam order
    pub elements: Vec<ElementConfig>,
}

impl BeamlineConfig {
    /// Lays out the beamline from the global origin.
    pub fn build(&self) -> Result<SegmentedBeamline, ConfigurationError> {
        let elements = self
            .elements
            .iter()
            .map(|e| {
                if e.angle == 0.0 {
                    BeamlineElement::drift(e.name.clone(), e.length)
                } else {
                    BeamlineElement::bend(e.name.clone(), e.length, e.angle)
                }
            })
            .collect();
        SegmentedBeamline::new(elements, self.s_start, Isometry3::identity())
    }
}

/// Top-level configuration of a `bunch` run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Seed of random stream 0
    pub seed: u64,
    /// Reference particle
    pub particle: ParticleConfig,
    /// Beam definition passed to the samplers
    pub beam: BeamDefinition,
    /// Optional reference beamline for curvilinear placement
    pub beamline: Option<BeamlineConfig>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            seed: 0,
            particle: ParticleConfig::default(),
            beam: BeamDefinition::default(),
            beamline: None,
        }
    }
}

impl CliConfig {
    /// Parses a TOML document; `path` only labels errors.
    pub fn from_toml(path: &str, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let label = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: label.clone(),
            message: e.to_string(),
        })?;
        Self::from_toml(&label, &content)
    }

    /// Applies `BUNCH_*` environment variable overrides.
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up through `lookup`.
    ///
    /// Recognised names: `BUNCH_LOG_LEVEL`, `BUNCH_SEED`, `BUNCH_DISTR_TYPE`,
    /// `BUNCH_DISTR_FILE`, `BUNCH_ONE_TURN_MAP_FILE`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("BUNCH_LOG_LEVEL") {
            self.log_level = level.parse()?;
        }
        if let Some(seed) = lookup("BUNCH_SEED") {
            self.seed = seed.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "BUNCH_SEED",
                value: seed.clone(),
            })?;
        }
        if let Some(tag) = lookup("BUNCH_DISTR_TYPE") {
            self.beam.distr_type = tag;
        }
        if let Some(path) = lookup("BUNCH_DISTR_FILE") {
            self.beam.distr_file = path;
        }
        if let Some(path) = lookup("BUNCH_ONE_TURN_MAP_FILE") {
            self.beam.one_turn_map_file = path;
        }
        Ok(self)
    }

    /// Validates everything that can be checked without building a sampler.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Err(e) = self.particle.definition() {
            errors.push(format!("particle: {e}"));
        }
        if let Err(e) = self.beam.distr_type.parse::<bunch_sampling::config::DistributionType>() {
            errors.push(format!("beam: {e}"));
        }
        if let Some(beamline) = &self.beamline {
            if let Err(e) = beamline.build() {
                errors.push(format!("beamline: {e}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Sampler factory for this configuration.
    ///
    /// `seed` overrides the configured seed.
    pub fn factory(&self, seed: Option<u64>) -> Result<SamplerFactory, ConfigurationError> {
        let mut factory = SamplerFactory::new().with_seed(seed.unwrap_or(self.seed));
        if let Some(beamline) = &self.beamline {
            let line = beamline.build()?;
            factory = factory
                .with_beamline_s(line.s_min())
                .with_beamline(Arc::new(line));
        }
        Ok(factory)
    }
}
