//! Polynomial map tables.
//!
//! ```text
//! @ NAME %s "ONE_TURN_MAP"
//! * NAME  COEF  NV  ORDER_DIM  ORDER  NX  NPX  NY  NPY  NDELTAP  NT
//! $ %s    %le   %d  %d         %d     %d  %d   %d  %d   %d       %d
//!   x     0.98  1   5          1      1   0    0   0    0        0
//! ```
//!
//! `NV` selects the output variable (1..=5 for x, px, y, py, δ). Terms with
//! a non-zero time exponent are ignored.

use std::path::Path;

use bunch_core::types::InitialisationError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::file::{parse_field, read_file};

/// Output variables of a map, in table order.
pub const MAP_VARIABLES: [&str; 5] = ["x", "px", "y", "py", "delta"];

/// One monomial `c · x^nx · px^npx · y^ny · py^npy · δ^nδ`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapTerm {
    /// Coefficient
    pub coefficient: f64,
    /// Exponent of x
    pub nx: i32,
    /// Exponent of px
    pub npx: i32,
    /// Exponent of y
    pub ny: i32,
    /// Exponent of py
    pub npy: i32,
    /// Exponent of δ
    pub ndelta: i32,
}

impl MapTerm {
    /// Value of the monomial at `(x, px, y, py, δ)`.
    #[inline]
    pub fn evaluate(&self, v: &[f64; 5]) -> f64 {
        self.coefficient
            * v[0].powi(self.nx)
            * v[1].powi(self.npx)
            * v[2].powi(self.ny)
            * v[3].powi(self.npy)
            * v[4].powi(self.ndelta)
    }

    /// Sum of the exponents.
    pub fn order(&self) -> i32 {
        self.nx + self.npx + self.ny + self.npy + self.ndelta
    }
}

/// Terms per output variable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OneTurnMapTable {
    terms: [Vec<MapTerm>; 5],
}

impl OneTurnMapTable {
    /// Table from explicit term lists in x, px, y, py, δ order.
    pub fn from_terms(terms: [Vec<MapTerm>; 5]) -> Self {
        Self { terms }
    }

    /// Reads a table file.
    ///
    /// # Errors
    ///
    /// Missing or unreadable files and malformed rows.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InitialisationError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let contents = read_file(&path)?;
        let table = Self::parse(&path, &contents)?;
        if table.is_empty() {
            return Err(InitialisationError::EmptyFile { path });
        }
        Ok(table)
    }

    /// Parses table text; `path` only labels errors.
    pub fn parse(path: &str, contents: &str) -> Result<Self, InitialisationError> {
        let mut table = Self::default();
        for (i, line) in contents.lines().enumerate() {
            let number = i + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with(['@', '*', '$']) {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 11 {
                return Err(InitialisationError::MalformedLine {
                    path: path.to_string(),
                    line: number,
                    message: format!("expected 11 columns, found {}", fields.len()),
                });
            }
            let integer = |index: usize, name: &str| -> Result<i32, InitialisationError> {
                let value = parse_field(path, number, name, fields[index])?;
                if value.fract() != 0.0 {
                    return Err(InitialisationError::MalformedLine {
                        path: path.to_string(),
                        line: number,
                        message: format!("{name} must be an integer, found {value}"),
                    });
                }
                Ok(value as i32)
            };

            let variable = integer(2, "nVector")?;
            if !(1..=5).contains(&variable) {
                return Err(InitialisationError::MalformedLine {
                    path: path.to_string(),
                    line: number,
                    message: format!("nVector must be between 1 and 5, found {variable}"),
                });
            }
            if integer(10, "nt")? != 0 {
                warn!(path = %path, line = number, "Ignoring one-turn map term with a time exponent");
                continue;
            }
            table.terms[(variable - 1) as usize].push(MapTerm {
                coefficient: parse_field(path, number, "coefficient", fields[1])?,
                nx: integer(5, "nx")?,
                npx: integer(6, "npx")?,
                ny: integer(7, "ny")?,
                npy: integer(8, "npy")?,
                ndelta: integer(9, "ndeltap")?,
            });
        }
        Ok(table)
    }

    /// Terms of output `variable` (0..5).
    pub fn terms(&self, variable: usize) -> &[MapTerm] {
        &self.terms[variable]
    }

    /// Total number of terms.
    pub fn len(&self) -> usize {
        self.terms.iter().map(Vec::len).sum()
    }

    /// True if no term was read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies the map once.
    pub fn evaluate(&self, v: &[f64; 5]) -> [f64; 5] {
        std::array::from_fn(|k| self.terms[k].iter().map(|t| t.evaluate(v)).sum())
    }
}
