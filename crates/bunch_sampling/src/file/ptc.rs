//! PTC ray files.
//!
//! ```text
//! ! comment
//! ptc_start, x=1.0e-3, px=0.0, y=-2.0e-4, py=1.0e-6, t=0.0, pt=1.0e-3;
//! ```
//!
//! Tokens are separated by whitespace, commas or semicolons. Recognised keys
//! are `x`, `px`, `y`, `py`, `t` (c·Δt in metres) and `pt` (ΔE/E0); missing
//! keys are zero and anything else on the line is ignored.

use bunch_core::types::{
    calculate_zp, BunchError, ConfigurationError, FullLocalCoords, GenerationError,
    InitialisationError,
};
use bunch_core::units::C_LIGHT;
use tracing::info;

use super::{apply_run_policy, parse_field, read_file, FileOptions, ReplayBuffer};
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// One PTC ray.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PtcRay {
    /// Horizontal position (m)
    pub x: f64,
    /// Horizontal direction component
    pub px: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Vertical direction component
    pub py: f64,
    /// Path-length difference c·Δt (m)
    pub t: f64,
    /// Relative energy deviation
    pub pt: f64,
}

impl PtcRay {
    /// Parses every ray in `contents`, skipping the first `lines_to_skip`
    /// lines, blanks and `!` comments.
    ///
    /// # Errors
    ///
    /// [`InitialisationError::MalformedLine`] for a value that is not a number.
    pub fn parse_all(
        path: &str,
        contents: &str,
        lines_to_skip: usize,
    ) -> Result<Vec<Self>, InitialisationError> {
        let mut rays = Vec::new();
        for (number, line) in contents.lines().enumerate().skip(lines_to_skip) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('!') {
                continue;
            }
            if let Some(ray) = Self::parse_line(path, number + 1, line)? {
                rays.push(ray);
            }
        }
        Ok(rays)
    }

    fn parse_line(path: &str, number: usize, line: &str) -> Result<Option<Self>, InitialisationError> {
        let mut ray = Self::default();
        let mut recognised = false;
        let tokens = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|t| !t.is_empty());
        for token in tokens {
            let Some((key, value)) = token.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let slot = match key.as_str() {
                "x" => &mut ray.x,
                "px" => &mut ray.px,
                "y" => &mut ray.y,
                "py" => &mut ray.py,
                "t" => &mut ray.t,
                "pt" => &mut ray.pt,
                _ => continue,
            };
            *slot = parse_field(path, number, &key, value.trim())?;
            recognised = true;
        }
        Ok(recognised.then_some(ray))
    }
}

/// Replays PTC rays about the centre.
///
/// `x = x0 + x`, `xp = xp0 + px`, `T = t0 + t/c`, `E = E0 (1 + pt)`.
#[derive(Clone, Debug)]
pub struct PtcDistribution {
    options: FileOptions,
    buffer: Option<ReplayBuffer<PtcRay>>,
}

impl PtcDistribution {
    /// Reads the file options; nothing is loaded yet.
    pub fn configure(definition: &BeamDefinition) -> Self {
        Self {
            options: FileOptions::from_definition(definition),
            buffer: None,
        }
    }

    /// Loaded rays.
    pub fn buffer(&self) -> Option<&ReplayBuffer<PtcRay>> {
        self.buffer.as_ref()
    }
}

impl LocalDistribution for PtcDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.options.require_path("ptc")
    }

    fn initialise(&mut self, _centre: &BunchCentre) -> Result<(), BunchError> {
        let path = &self.options.path;
        let contents = read_file(path)?;
        let rays = PtcRay::parse_all(path, &contents, self.options.lines_to_skip)?;
        if rays.is_empty() {
            return Err(InitialisationError::EmptyFile { path: path.clone() }.into());
        }
        info!(path = %path, rays = rays.len(), "Loaded PTC file");
        self.buffer = Some(self.options.buffer(rays));
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
        let buffer = self
            .buffer
            .as_mut()
            .ok_or(GenerationError::NotInitialised { distribution: "ptc" })?;
        let ray = *buffer.next_entry()?;
        let xp = centre.xp0 + ray.px;
        let yp = centre.yp0 + ray.py;
        Ok(FullLocalCoords {
            x: centre.x0 + ray.x,
            y: centre.y0 + ray.y,
            z: centre.z0,
            xp,
            yp,
            zp: calculate_zp(xp, yp, centre.zp0)?,
            t: centre.t0 + ray.t / C_LIGHT,
            s: centre.s_at(centre.z0),
            total_energy: centre.e0 * (1.0 + ray.pt),
            weight: 1.0,
        })
    }

    fn file_entries(&self) -> Option<usize> {
        self.buffer.as_ref().map(ReplayBuffer::len)
    }
}
