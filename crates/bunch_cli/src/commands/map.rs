//! Map command implementation
//!
//! Draws one primary from the configured distribution and follows it
//! through the one-turn map for a number of turns.

use std::io::Write;

use bunch_core::types::{BunchError, ReferenceParticle};
use bunch_sampling::bunch::DEFAULT_MAX_TRIES;
use nalgebra::Vector3;
use serde::Serialize;
use tracing::info;

use crate::config::CliConfig;
use crate::{CliError, Result};

/// Primary state after one turn
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TurnRecord {
    /// Turn number, starting at 1
    pub turn: u32,
    /// Horizontal position (m)
    pub x: f64,
    /// Horizontal momentum (GeV/c)
    pub px: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Vertical momentum (GeV/c)
    pub py: f64,
    /// Longitudinal momentum (GeV/c)
    pub pz: f64,
}

/// Run the map command
///
/// Returns one record per turn in `1..=turns`.
pub fn run(config: &CliConfig, turns: u32, seed: Option<u64>) -> Result<Vec<TurnRecord>> {
    if turns == 0 {
        return Err(CliError::invalid_argument("--turns must be at least 1"));
    }
    let reference = config.particle.definition()?;
    let factory = config.factory(seed)?;
    let mut map = factory
        .build_one_turn_map(&reference, &config.beam)?
        .ok_or_else(|| CliError::invalid_argument("beam.one_turn_map_file is not set"))?;

    let mut sampler = factory.build(&reference, &config.beam)?;
    let primary = sampler
        .next_valid(DEFAULT_MAX_TRIES)
        .map_err(BunchError::from)?
        .local;
    let momentum = primary.momentum(sampler.particle_definition().mass());
    let direction = Vector3::new(primary.xp, primary.yp, primary.zp);
    map.set_initial_primary_coordinates(primary.x, primary.y, direction, momentum);
    info!(turns, x = primary.x, y = primary.y, momentum, "Tracking primary through one-turn map");

    let records = (1..=turns)
        .map(|turn| {
            let c = map.get_this_turn(turn);
            TurnRecord {
                turn,
                x: c.x,
                px: c.px,
                y: c.y,
                py: c.py,
                pz: c.pz,
            }
        })
        .collect();
    Ok(records)
}

/// Writes turn records as CSV.
pub fn write_turns<W: Write>(writer: W, records: &[TurnRecord]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}
