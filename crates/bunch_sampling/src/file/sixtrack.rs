//! SixTrack particle files: ten whitespace-separated columns per row.
//!
//! ```text
//! id  turn  S[m]  x[mm]  xp[mrad]  y[mm]  yp[mrad]  dE/E  pdg  turns
//! ```

use bunch_core::types::{
    calculate_zp, BunchError, ConfigurationError, FullLocalCoords, GenerationError,
    InitialisationError, ParticleSpecies,
};
use bunch_core::units::{MM, MRAD};
use tracing::info;

use super::{apply_run_policy, parse_field, read_file, FileOptions, ReplayBuffer};
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

const COLUMNS: usize = 10;

/// One SixTrack row in SI units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SixTrackRow {
    /// Path length (m)
    pub s: f64,
    /// Horizontal position (m)
    pub x: f64,
    /// Horizontal slope (rad)
    pub xp: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Vertical slope (rad)
    pub yp: f64,
    /// Relative energy deviation
    pub delta_e: f64,
    /// Particle species from the PDG code
    pub species: ParticleSpecies,
}

impl SixTrackRow {
    /// Parses all rows, skipping `lines_to_skip` leading lines, blanks and
    /// lines starting with `#` or `!`.
    ///
    /// # Errors
    ///
    /// [`InitialisationError::MalformedLine`] for a short row, a non-numeric
    /// value or an unknown PDG code.
    pub fn parse_all(
        path: &str,
        contents: &str,
        lines_to_skip: usize,
    ) -> Result<Vec<Self>, InitialisationError> {
        contents
            .lines()
            .enumerate()
            .skip(lines_to_skip)
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !(line.is_empty() || line.starts_with('#') || line.starts_with('!')))
            .map(|(number, line)| Self::parse_line(path, number, line))
            .collect()
    }

    fn parse_line(path: &str, number: usize, line: &str) -> Result<Self, InitialisationError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < COLUMNS {
            return Err(InitialisationError::MalformedLine {
                path: path.to_string(),
                line: number,
                message: format!("expected {COLUMNS} columns, found {}", fields.len()),
            });
        }
        let value = |index: usize, name: &str| parse_field(path, number, name, fields[index]);

        let pdg = value(8, "particle type")?;
        let species = ParticleSpecies::from_pdg(pdg as i32)
            .filter(|_| pdg.fract() == 0.0)
            .ok_or_else(|| InitialisationError::MalformedLine {
                path: path.to_string(),
                line: number,
                message: format!("unknown particle type {pdg}"),
            })?;

        Ok(Self {
            s: value(2, "S")?,
            x: value(3, "x")? * MM,
            xp: value(4, "xp")? * MRAD,
            y: value(5, "y")? * MM,
            yp: value(6, "yp")? * MRAD,
            delta_e: value(7, "dE/E")?,
            species,
        })
    }
}

/// Replays SixTrack rows about the centre.
///
/// The file S becomes a longitudinal offset; a change of particle type
/// between rows is reported as a species update.
#[derive(Clone, Debug)]
pub struct SixTrackDistribution {
    options: FileOptions,
    buffer: Option<ReplayBuffer<SixTrackRow>>,
    last_species: Option<ParticleSpecies>,
    pending_species: Option<ParticleSpecies>,
}

impl SixTrackDistribution {
    /// Reads the file options; nothing is loaded yet.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            options: FileOptions::from_definition(definition),
            buffer: None,
            last_species: None,
            pending_species: None,
        }
    }
}

impl LocalDistribution for SixTrackDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.options.require_path("sixtrack")
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        let path = &self.options.path;
        let contents = read_file(path)?;
        let rows = SixTrackRow::parse_all(path, &contents, self.options.lines_to_skip)?;
        if rows.is_empty() {
            return Err(InitialisationError::EmptyFile { path: path.clone() }.into());
        }
        info!(path = %path, rows = rows.len(), "Loaded SixTrack file");
        self.last_species = Some(centre.species);
        self.pending_species = None;
        self.buffer = Some(self.options.buffer(rows));
        Ok(())
    }

    fn begin_of_run(
        &mut self,
        _centre: &BunchCentre,
        _rng: &mut BunchRng,
        number_of_events: usize,
        batch_mode: bool,
    ) -> Result<(), BunchError> {
        if let Some(buffer) = self.buffer.as_mut() {
            apply_run_policy(buffer, number_of_events, batch_mode)?;
        }
        Ok(())
    }

    fn sample(
        &mut self,
        centre: &BunchCentre,
        _rng: &mut BunchRng,
    ) -> Result<FullLocalCoords, GenerationError> {
        let buffer = self.buffer.as_mut().ok_or(GenerationError::NotInitialised {
            distribution: "sixtrack",
        })?;
        let row = *buffer.next_entry()?;
        if self.last_species != Some(row.species) {
            self.last_species = Some(row.species);
            self.pending_species = Some(row.species);
        }

        let xp = centre.xp0 + row.xp;
        let yp = centre.yp0 + row.yp;
        let z = centre.z0 + row.s;
        Ok(FullLocalCoords {
            x: centre.x0 + row.x,
            y: centre.y0 + row.y,
            z,
            xp,
            yp,
            zp: calculate_zp(xp, yp, centre.zp0)?,
            t: centre.t0,
            s: centre.s_at(z),
            total_energy: centre.e0 * (1.0 + row.delta_e),
            weight: 1.0,
        })
    }

    fn take_species_update(&mut self) -> Option<ParticleSpecies> {
        self.pending_species.take()
    }

    fn file_entries(&self) -> Option<usize> {
        self.buffer.as_ref().map(ReplayBuffer::len)
    }
}
