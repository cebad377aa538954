//! Beam definition and distribution selection.
//!
//! [`BeamDefinition`] is the user-facing record; samplers read what they
//! need from it once, at configure time, and never look at it again.

mod definition;
mod distribution;

pub use definition::BeamDefinition;
pub use distribution::{CompositeWeight, DistributionType};
