//! Final-state particles from HepMC3 ASCII event files.
//!
//! Only these record types are read; everything else is skipped:
//!
//! ```text
//! E <event> <vertices> <particles> [@ <x> <y> <z> <t>]
//! U <GEV|MEV> <MM|CM>
//! P <id> <parent> <pdg> <px> <py> <pz> <e> <m> <status>
//! ```
//!
//! Particles with status 1 are candidates. Each candidate passes through an
//! [`EventWindow`] once, at load time; the survivors are replayed in order.

use bunch_core::types::{
    BunchError, ConfigurationError, FullLocalCoords, GenerationError, InitialisationError,
    ParticleSpecies,
};
use bunch_core::units::{CM, C_LIGHT, MEV, MM};
use nalgebra::Vector3;
use tracing::{debug, info, warn};

use super::{apply_run_policy, parse_field, read_file, FileOptions, ReplayBuffer};
use crate::bunch::{BunchCentre, LocalDistribution};
use crate::config::BeamDefinition;
use crate::rng::BunchRng;

/// One final-state particle in SI units and GeV.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HepMcParticle {
    /// Species resolved from the PDG code
    pub species: ParticleSpecies,
    /// Vertex position (m)
    pub position: Vector3<f64>,
    /// Vertex time (s)
    pub t: f64,
    /// Unit direction of the momentum
    pub direction: Vector3<f64>,
    /// Total energy (GeV)
    pub total_energy: f64,
}

impl HepMcParticle {
    /// Kinetic energy against the species rest mass (GeV).
    pub fn kinetic_energy(&self) -> f64 {
        self.total_energy - self.species.mass
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Bounds {
    name: &'static str,
    min: f64,
    max: f64,
}

impl Bounds {
    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Acceptance window applied to every candidate particle.
#[derive(Clone, Debug, PartialEq)]
pub struct EventWindow {
    x: Bounds,
    y: Bounds,
    z: Bounds,
    xp: Bounds,
    yp: Bounds,
    zp: Bounds,
    rp: Bounds,
    t: Bounds,
    ek: Bounds,
    allowed: Option<Vec<i32>>,
}

impl EventWindow {
    /// Reads the `eventgenerator_*` fields.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::UnknownParticle`] for a particle name that is
    /// neither a known name nor an integer PDG code.
    pub fn configure(definition: &BeamDefinition) -> Result<Self, ConfigurationError> {
        let d = definition;
        let bounds = |name, min, max| Bounds { name, min, max };
        Ok(Self {
            x: bounds("eventgenerator_min_x/eventgenerator_max_x", d.eventgenerator_min_x, d.eventgenerator_max_x),
            y: bounds("eventgenerator_min_y/eventgenerator_max_y", d.eventgenerator_min_y, d.eventgenerator_max_y),
            z: bounds("eventgenerator_min_z/eventgenerator_max_z", d.eventgenerator_min_z, d.eventgenerator_max_z),
            xp: bounds("eventgenerator_min_xp/eventgenerator_max_xp", d.eventgenerator_min_xp, d.eventgenerator_max_xp),
            yp: bounds("eventgenerator_min_yp/eventgenerator_max_yp", d.eventgenerator_min_yp, d.eventgenerator_max_yp),
            zp: bounds("eventgenerator_min_zp/eventgenerator_max_zp", d.eventgenerator_min_zp, d.eventgenerator_max_zp),
            rp: bounds("eventgenerator_min_rp/eventgenerator_max_rp", d.eventgenerator_min_rp, d.eventgenerator_max_rp),
            t: bounds("eventgenerator_min_t/eventgenerator_max_t", d.eventgenerator_min_t, d.eventgenerator_max_t),
            ek: bounds("eventgenerator_min_ek/eventgenerator_max_ek", d.eventgenerator_min_ek, d.eventgenerator_max_ek),
            allowed: parse_particle_list(&d.eventgenerator_particles)?,
        })
    }

    fn bounds(&self) -> [&Bounds; 9] {
        [
            &self.x, &self.y, &self.z, &self.xp, &self.yp, &self.zp, &self.rp, &self.t, &self.ek,
        ]
    }

    /// Fails unless `min < max` for every window.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for b in self.bounds() {
            if !(b.min < b.max) {
                return Err(ConfigurationError::InvalidRange {
                    name: b.name,
                    min: b.min,
                    max: b.max,
                });
            }
        }
        Ok(())
    }

    /// PDG codes accepted, `None` if every species is.
    pub fn allowed(&self) -> Option<&[i32]> {
        self.allowed.as_deref()
    }

    /// True if the particle lies inside every window.
    pub fn accepts(&self, particle: &HepMcParticle) -> bool {
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(&particle.species.pdg_id) {
                return false;
            }
        }
        let p = &particle.position;
        let d = &particle.direction;
        self.x.contains(p.x)
            && self.y.contains(p.y)
            && self.z.contains(p.z)
            && self.xp.contains(d.x)
            && self.yp.contains(d.y)
            && self.zp.contains(d.z)
            && self.rp.contains(d.x.hypot(d.y))
            && self.t.contains(particle.t)
            && self.ek.contains(particle.kinetic_energy())
    }
}

fn parse_particle_list(list: &str) -> Result<Option<Vec<i32>>, ConfigurationError> {
    let ids = list
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|token| {
            token
                .parse::<i32>()
                .ok()
                .or_else(|| ParticleSpecies::from_name(token).map(|s| s.pdg_id))
                .ok_or_else(|| ConfigurationError::UnknownParticle(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((!ids.is_empty()).then_some(ids))
}

/// Outcome of reading an event file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HepMcContents {
    /// Candidates that passed the window
    pub accepted: Vec<HepMcParticle>,
    /// Final-state particles seen
    pub candidates: usize,
    /// Candidates dropped by the window or for an unknown species
    pub rejected: usize,
    /// Candidates dropped because the PDG code has no known species
    pub unknown_species: usize,
}

/// Reads every final-state particle of `contents` through `window`.
///
/// # Errors
///
/// [`InitialisationError::MalformedLine`] for a short or non-numeric record.
pub fn parse_hepmc3(
    path: &str,
    contents: &str,
    window: &EventWindow,
) -> Result<HepMcContents, InitialisationError> {
    let mut result = HepMcContents::default();
    let mut momentum_unit = 1.0;
    let mut length_unit = MM;
    let mut vertex = (Vector3::zeros(), 0.0);

    for (i, line) in contents.lines().enumerate() {
        let number = i + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let malformed = |message: String| InitialisationError::MalformedLine {
            path: path.to_string(),
            line: number,
            message,
        };
        match fields.first().copied() {
            Some("E") => {
                vertex = (Vector3::zeros(), 0.0);
                if let Some(at) = fields.iter().position(|f| *f == "@") {
                    if fields.len() < at + 5 {
                        return Err(malformed("event position needs x y z t".to_string()));
                    }
                    let v = |k: usize, name: &str| parse_field(path, number, name, fields[at + k]);
                    // Scaled per particle: the event's `U` record follows its `E` line.
                    vertex = (Vector3::new(v(1, "x")?, v(2, "y")?, v(3, "z")?), v(4, "t")?);
                }
            }
            Some("U") => {
                if fields.len() < 3 {
                    return Err(malformed("unit record needs momentum and length units".to_string()));
                }
                momentum_unit = match fields[1].to_ascii_uppercase().as_str() {
                    "GEV" => 1.0,
                    "MEV" => MEV,
                    other => return Err(malformed(format!("unknown momentum unit {other}"))),
                };
                length_unit = match fields[2].to_ascii_uppercase().as_str() {
                    "MM" => MM,
                    "CM" => CM,
                    other => return Err(malformed(format!("unknown length unit {other}"))),
                };
            }
            Some("P") => {
                if fields.len() < 10 {
                    return Err(malformed(format!("particle record has {} fields, expected 10", fields.len())));
                }
                let status = parse_field(path, number, "status", fields[9])?;
                if status != 1.0 {
                    continue;
                }
                result.candidates += 1;
                let pdg = parse_field(path, number, "pdg", fields[3])? as i32;
                let v = |k: usize, name: &str| parse_field(path, number, name, fields[k]);
                let momentum = Vector3::new(v(4, "px")?, v(5, "py")?, v(6, "pz")?) * momentum_unit;
                let energy = v(7, "e")? * momentum_unit;

                let Some(species) = ParticleSpecies::from_pdg(pdg) else {
                    debug!(line = number, pdg, "Skipping particle with unknown species");
                    result.unknown_species += 1;
                    result.rejected += 1;
                    continue;
                };
                let Some(direction) = momentum.try_normalize(0.0) else {
                    debug!(line = number, pdg, "Skipping particle with zero momentum");
                    result.rejected += 1;
                    continue;
                };
                let particle = HepMcParticle {
                    species,
                    position: vertex.0 * length_unit,
                    t: vertex.1 * length_unit / C_LIGHT,
                    direction,
                    total_energy: energy,
                };
                if window.accepts(&particle) {
                    result.accepted.push(particle);
                } else {
                    result.rejected += 1;
                }
            }
            _ => {}
        }
    }
    Ok(result)
}

/// Replays filtered HepMC3 particles about the centre.
///
/// Positions and times are offsets from the centre; the direction and total
/// energy are taken from the file.
#[derive(Clone, Debug)]
pub struct EventGeneratorDistribution {
    options: FileOptions,
    window: EventWindow,
    warn_skipped: bool,
    buffer: Option<ReplayBuffer<HepMcParticle>>,
    last_species: Option<ParticleSpecies>,
    pending_species: Option<ParticleSpecies>,
}

impl EventGeneratorDistribution {
    /// Reads file options and the acceptance window.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::UnknownParticle`] for a bad particle list.
    pub fn configure(definition: &BeamDefinition) -> Result<Self, ConfigurationError> {
        Ok(Self {
            options: FileOptions::from_definition(definition),
            window: EventWindow::configure(definition)?,
            warn_skipped: definition.eventgenerator_warn_skipped_particles,
            buffer: None,
            last_species: None,
            pending_species: None,
        })
    }

    /// Acceptance window.
    pub fn window(&self) -> &EventWindow {
        &self.window
    }

    /// Accepted particles.
    pub fn buffer(&self) -> Option<&ReplayBuffer<HepMcParticle>> {
        self.buffer.as_ref()
    }
}

impl LocalDistribution for EventGeneratorDistribution {
    fn validate(&self) -> Result<(), ConfigurationError> {
        self.options.require_path("eventgenerator")?;
        let format = self.options.format.trim();
        if !(format.is_empty() || format.eq_ignore_ascii_case("hepmc3")) {
            return Err(ConfigurationError::UnsupportedFileFormat(format.to_string()));
        }
        self.window.validate()
    }

    fn initialise(&mut self, centre: &BunchCentre) -> Result<(), BunchError> {
        let path = &self.options.path;
        let contents = read_file(path)?;
        let parsed = parse_hepmc3(path, &contents, &self.window)?;
        if parsed.unknown_species > 0 {
            warn!(
                path = %path,
                skipped = parsed.unknown_species,
                "Event generator particles with unknown PDG codes skipped"
            );
        }
        if parsed.candidates == 0 {
            return Err(InitialisationError::EmptyFile { path: path.clone() }.into());
        }
        if parsed.accepted.is_empty() {
            return Err(InitialisationError::NoAcceptedParticles {
                path: path.clone(),
                rejected: parsed.rejected,
            }
            .into());
        }
        if self.warn_skipped && parsed.rejected > 0 {
            warn!(
                path = %path,
                skipped = parsed.rejected,
                "Event generator particles skipped by the filter"
            );
        }
        info!(
            path = %path,
            accepted = parsed.accepted.len(),
            candidates = parsed.candidates,
            "Loaded event generator file"
        );
        self.buffer = Some(self.options.buffer(parsed.accepted));
        self.last_species = Some(centre.species);
        self.pending_species = None;
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
            distribution: "eventgenerator",
        })?;
        let particle = *buffer.next_entry()?;
        if self.last_species != Some(particle.species) {
            self.last_species = Some(particle.species);
            self.pending_species = Some(particle.species);
        }

        let z = centre.z0 + particle.position.z;
        Ok(FullLocalCoords {
            x: centre.x0 + particle.position.x,
            y: centre.y0 + particle.position.y,
            z,
            xp: particle.direction.x,
            yp: particle.direction.y,
            zp: particle.direction.z,
            t: centre.t0 + particle.t,
            s: centre.s_at(z),
            total_energy: particle.total_energy,
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
