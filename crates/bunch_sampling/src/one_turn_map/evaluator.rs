//! Turn-by-turn application of a one-turn map to the primary particle.

use std::collections::BTreeSet;

use nalgebra::Vector3;
use serde::Serialize;
use tracing::debug;

use super::OneTurnMapTable;

/// Relative momentum deviation beyond which the map is not applied.
pub const MOMENTUM_TOLERANCE: f64 = 0.05;

/// Transverse state after a turn, with absolute momenta (GeV/c).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MapCoordinates {
    /// Horizontal position (m)
    pub x: f64,
    /// Horizontal momentum
    pub px: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Vertical momentum
    pub py: f64,
    /// Longitudinal momentum
    pub pz: f64,
}

/// One-turn map with a per-turn cache.
///
/// The cached state is `(x, px, y, py, δ)` with `px`, `py` normalised to the
/// reference momentum and `δ = (P − P0)/P0`. Asking for the same turn twice
/// returns the cached result; a later turn evaluates the map exactly once.
#[derive(Clone, Debug)]
pub struct OneTurnMap {
    table: OneTurnMapTable,
    reference_momentum: f64,
    beam_offset_s0: bool,
    state: [f64; 5],
    last_turn: u32,
    scattered_turns: BTreeSet<u32>,
    scattered_since_update: bool,
}

impl OneTurnMap {
    /// Map over `table` for reference momentum `reference_momentum` (GeV/c).
    ///
    /// With `beam_offset_s0` the bunch starts part way round the machine and
    /// the first turn is never mapped.
    pub fn new(table: OneTurnMapTable, reference_momentum: f64, beam_offset_s0: bool) -> Self {
        Self {
            table,
            reference_momentum,
            beam_offset_s0,
            state: [0.0; 5],
            last_turn: 0,
            scattered_turns: BTreeSet::new(),
            scattered_since_update: false,
        }
    }

    /// Starts tracking a new primary on turn 1.
    ///
    /// `direction` is the unit momentum direction and `momentum` its
    /// magnitude (GeV/c).
    pub fn set_initial_primary_coordinates(
        &mut self,
        x: f64,
        y: f64,
        direction: Vector3<f64>,
        momentum: f64,
    ) {
        self.state = self.normalise(x, y, direction * momentum);
        self.last_turn = 1;
        self.scattered_turns.clear();
        self.scattered_since_update = false;
    }

    /// True if the map should replace tracking for this turn.
    pub fn should_apply_to_primary(&self, momentum: f64, turn: u32) -> bool {
        if self.beam_offset_s0 && turn == 1 {
            return false;
        }
        if self.scattered_since_update || self.scattered_turns.contains(&turn) {
            return false;
        }
        let deviation = (momentum - self.reference_momentum).abs() / self.reference_momentum;
        deviation <= MOMENTUM_TOLERANCE
    }

    /// Notes that the primary interacted on `turn`.
    pub fn record_scatter(&mut self, turn: u32) {
        self.scattered_turns.insert(turn);
        self.scattered_since_update = true;
    }

    /// Coordinates for `turn`, applying the map once per new turn.
    pub fn get_this_turn(&mut self, turn: u32) -> MapCoordinates {
        if turn > self.last_turn {
            self.state = self.table.evaluate(&self.state);
            self.last_turn = turn;
            self.scattered_since_update = false;
            debug!(turn, x = self.state[0], y = self.state[2], "Applied one-turn map");
        }
        self.coordinates()
    }

    /// Resynchronises from tracked coordinates without applying the map.
    ///
    /// Ignored if `turn` has already been processed.
    pub fn update_coordinates(&mut self, position: Vector3<f64>, momentum: Vector3<f64>, turn: u32) {
        if turn <= self.last_turn {
            return;
        }
        self.state = self.normalise(position.x, position.y, momentum);
        self.last_turn = turn;
        self.scattered_since_update = false;
    }

    /// Last processed turn.
    pub fn last_turn(&self) -> u32 {
        self.last_turn
    }

    /// Cached `(x, px, y, py, δ)`.
    pub fn state(&self) -> [f64; 5] {
        self.state
    }

    /// Map table.
    pub fn table(&self) -> &OneTurnMapTable {
        &self.table
    }

    fn normalise(&self, x: f64, y: f64, momentum: Vector3<f64>) -> [f64; 5] {
        let p0 = self.reference_momentum;
        [
            x,
            momentum.x / p0,
            y,
            momentum.y / p0,
            (momentum.norm() - p0) / p0,
        ]
    }

    fn coordinates(&self) -> MapCoordinates {
        let p0 = self.reference_momentum;
        let [x, px, y, py, delta] = self.state;
        let (px, py) = (px * p0, py * p0);
        let total = p0 * (1.0 + delta);
        MapCoordinates {
            x,
            px,
            y,
            py,
            pz: (total * total - px * px - py * py).max(0.0).sqrt(),
        }
    }
}
