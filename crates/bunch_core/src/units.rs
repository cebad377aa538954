//! Physical constants and unit conventions.
//!
//! All quantities in the workspace use SI lengths and times with energies in GeV:
//!
//! | Quantity | Unit |
//! |----------|------|
//! | length   | m    |
//! | time     | s    |
//! | energy   | GeV  |
//! | momentum | GeV/c|

/// Speed of light in vacuum (m/s).
pub const C_LIGHT: f64 = 299_792_458.0;

/// Conversion from momentum in GeV/c to magnetic rigidity in T·m for unit charge.
pub const GEV_TO_TESLA_METRE: f64 = 1.0e9 / C_LIGHT;

/// Backwards nudge applied to the injection point so it never starts exactly on
/// a geometry boundary (m).
pub const LENGTH_SAFETY_LARGE: f64 = 1.0e-6;

/// How far outside the beamline range an S coordinate may fall before the
/// curvilinear transform refuses it (m).
pub const CURVILINEAR_S_TOLERANCE: f64 = 1.0;

/// Millimetre in metres.
pub const MM: f64 = 1.0e-3;

/// Milliradian in radians.
pub const MRAD: f64 = 1.0e-3;

/// Centimetre in metres.
pub const CM: f64 = 1.0e-2;

/// MeV in GeV.
pub const MEV: f64 = 1.0e-3;

/// Atomic mass unit (GeV/c²).
pub const AMU_C2: f64 = 0.931_494_102_42;
