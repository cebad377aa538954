//! # bunch_cli
//!
//! Command line front end for the bunch samplers.
//!
//! # Commands
//!
//! - `bunch generate` - Generate a bunch and write it as CSV or JSON
//! - `bunch check` - Validate a configuration and report what it builds
//! - `bunch map` - Follow one primary through a one-turn map
//!
//! Configuration is read from a TOML file, then `BUNCH_*` environment
//! variables, then command line flags.

pub mod commands;
pub mod config;
pub mod error;

pub use error::{CliError, Result};
