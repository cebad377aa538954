//! # File Replay
//!
//! Distributions that replay particles read from a file:
//!
//! | Type | Format |
//! |------|--------|
//! | [`PtcDistribution`] | PTC `key=value` rays |
//! | [`SixTrackDistribution`] | SixTrack ten-column rows |
//! | [`EventGeneratorDistribution`] | HepMC3 ASCII final-state particles |
//!
//! The whole file is read at initialisation into a [`ReplayBuffer`], which
//! hands out entries in order and either wraps or fails at the end.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use bunch_core::types::{ConfigurationError, GenerationError, InitialisationError};
use tracing::info;

use crate::config::BeamDefinition;

pub mod event_generator;
pub mod ptc;
pub mod sixtrack;

pub use event_generator::{EventGeneratorDistribution, EventWindow, HepMcParticle};
pub use ptc::{PtcDistribution, PtcRay};
pub use sixtrack::{SixTrackDistribution, SixTrackRow};

/// Entries of a file, handed out in order.
///
/// A buffer may pass over its entries a limited number of times
/// (`distr_file_loop_n_times`) or indefinitely (`distr_file_loop`).
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayBuffer<T> {
    path: String,
    entries: Vec<T>,
    index: usize,
    pass: usize,
    pass_limit: Option<usize>,
}

impl<T> ReplayBuffer<T> {
    /// Buffer over `entries`.
    ///
    /// `pass_limit` of `None` loops forever; `Some(n)` allows `n` full passes
    /// (at least one).
    pub fn new(path: impl Into<String>, entries: Vec<T>, pass_limit: Option<usize>) -> Self {
        Self {
            path: path.into(),
            entries,
            index: 0,
            pass: 0,
            pass_limit: pass_limit.map(|n| n.max(1)),
        }
    }

    /// Source path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in file order.
    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    /// Index of the next entry.
    pub fn position(&self) -> usize {
        self.index
    }

    /// True if the buffer wraps without limit.
    pub fn is_looping(&self) -> bool {
        self.pass_limit.is_none()
    }

    /// Removes the pass limit.
    pub fn enable_looping(&mut self) {
        self.pass_limit = None;
    }

    /// Total entries that can still be handed out, `None` if unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.pass_limit.map(|limit| limit * self.entries.len())
    }

    /// Fails if `requested` entries cannot be supplied.
    pub fn ensure_capacity(&self, requested: usize) -> Result<(), ConfigurationError> {
        match self.capacity() {
            Some(available) if requested > available => {
                Err(ConfigurationError::InsufficientFileEntries {
                    path: self.path.clone(),
                    requested,
                    available,
                })
            }
            _ => Ok(()),
        }
    }

    /// Next entry, wrapping to the start when another pass is allowed.
    ///
    /// # Errors
    ///
    /// [`GenerationError::ReplayExhausted`] once every allowed pass is used.
    pub fn next_entry(&mut self) -> Result<&T, GenerationError> {
        let exhausted = || GenerationError::ReplayExhausted {
            path: self.path.clone(),
            entries: self.entries.len(),
        };
        if self.entries.is_empty() {
            return Err(exhausted());
        }
        if self.index == self.entries.len() {
            if let Some(limit) = self.pass_limit {
                if self.pass + 1 >= limit {
                    return Err(exhausted());
                }
            }
            self.pass += 1;
            self.index = 0;
            info!(path = %self.path, pass = self.pass, "Replay file wrapped to the first entry");
        }
        let entry = &self.entries[self.index];
        self.index += 1;
        Ok(entry)
    }
}

/// File options shared by every replay distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct FileOptions {
    /// Path of the file, empty if unset
    pub path: String,
    /// Format name for formats with variants
    pub format: String,
    /// Loop without limit
    pub looping: bool,
    /// Passes allowed when not looping
    pub loop_n_times: usize,
    /// Leading lines to skip
    pub lines_to_skip: usize,
}

impl FileOptions {
    /// Reads the `distr_file*` and `n_lines_ignore` fields.
    pub fn from_definition(definition: &BeamDefinition) -> Self {
        Self {
            path: definition.distr_file.clone(),
            format: definition.distr_file_format.clone(),
            looping: definition.distr_file_loop,
            loop_n_times: definition.distr_file_loop_n_times,
            lines_to_skip: definition.n_lines_ignore,
        }
    }

    /// Fails if no file is named.
    pub fn require_path(&self, distribution: &'static str) -> Result<(), ConfigurationError> {
        if self.path.trim().is_empty() {
            Err(ConfigurationError::MissingFile { distribution })
        } else {
            Ok(())
        }
    }

    /// Pass limit for a [`ReplayBuffer`].
    pub fn pass_limit(&self) -> Option<usize> {
        if self.looping {
            None
        } else {
            Some(self.loop_n_times.max(1))
        }
    }

    /// Buffer over `entries` with these options.
    pub fn buffer<T>(&self, entries: Vec<T>) -> ReplayBuffer<T> {
        ReplayBuffer::new(self.path.clone(), entries, self.pass_limit())
    }
}

/// Reads a whole text file.
pub(crate) fn read_file(path: &str) -> Result<String, InitialisationError> {
    fs::read_to_string(Path::new(path)).map_err(|e| match e.kind() {
        ErrorKind::NotFound => InitialisationError::FileNotFound {
            path: path.to_string(),
        },
        _ => InitialisationError::Io {
            path: path.to_string(),
            message: e.to_string(),
        },
    })
}

/// Parses a float field of a line.
pub(crate) fn parse_field(
    path: &str,
    line: usize,
    name: &str,
    token: &str,
) -> Result<f64, InitialisationError> {
    token
        .parse::<f64>()
        .map_err(|_| InitialisationError::MalformedLine {
            path: path.to_string(),
            line,
            message: format!("cannot parse {name} from '{token}'"),
        })
}

/// Shared `begin_of_run` file policy: interactively the buffer loops, in
/// batch mode it must hold enough entries.
pub(crate) fn apply_run_policy<T>(
    buffer: &mut ReplayBuffer<T>,
    number_of_events: usize,
    batch_mode: bool,
) -> Result<(), ConfigurationError> {
    if batch_mode {
        buffer.ensure_capacity(number_of_events)
    } else {
        if !buffer.is_looping() {
            info!(path = %buffer.path(), "Interactive run: enabling file looping");
        }
        buffer.enable_looping();
        Ok(())
    }
}
