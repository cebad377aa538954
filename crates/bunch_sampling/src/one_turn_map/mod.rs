//! # One-Turn Maps
//!
//! Truncated polynomial maps that advance `(x, px, y, py, δ)` by one turn
//! of a circular machine:
//!
//! - [`OneTurnMapTable`]: terms read from a table file
//! - [`OneTurnMap`]: turn-by-turn state with once-per-turn evaluation

mod evaluator;
mod table;

pub use evaluator::{MapCoordinates, OneTurnMap, MOMENTUM_TOLERANCE};
pub use table::{MapTerm, OneTurnMapTable, MAP_VARIABLES};
