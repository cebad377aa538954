//! Phase-space coordinate types.
//!
//! Local and global coordinates have identical fields but are distinct types so
//! that a generator-local coordinate set can never be passed where a global one
//! is expected.
//!
//! Directions are stored as unit-vector components (`xp`, `yp`, `zp`), not as
//! angles. Once a coordinate set is finalised `xp² + yp² + zp² = 1`.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::error::GenerationError;

/// Computes the longitudinal direction component from the transverse ones.
///
/// Returns `±√(1 − xp² − yp²)` with the sign of `zp_hint` (zero counts as
/// positive).
///
/// # Errors
///
/// Returns [`GenerationError::InvalidDirection`] if `xp² + yp² ≥ 1`.
///
/// # Examples
/// ```
/// use bunch_core::types::calculate_zp;
///
/// assert!((calculate_zp(0.0, 0.0, 1.0).unwrap() - 1.0).abs() < 1e-15);
/// assert!(calculate_zp(0.6, 0.0, -1.0).unwrap() < 0.0);
/// assert!(calculate_zp(0.8, 0.6, 1.0).is_err());
/// ```
pub fn calculate_zp(xp: f64, yp: f64, zp_hint: f64) -> Result<f64, GenerationError> {
    let transverse = xp * xp + yp * yp;
    if !(transverse < 1.0) {
        return Err(GenerationError::InvalidDirection { xp, yp });
    }
    let zp = (1.0 - transverse).sqrt();
    Ok(if zp_hint < 0.0 { -zp } else { zp })
}

/// Position, direction and time in the generator-local frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalCoords {
    /// Horizontal position (m)
    pub x: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Longitudinal position (m)
    pub z: f64,
    /// Horizontal direction component
    pub xp: f64,
    /// Vertical direction component
    pub yp: f64,
    /// Longitudinal direction component
    pub zp: f64,
    /// Arrival time (s)
    pub t: f64,
}

impl LocalCoords {
    /// Returns the position as a point.
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Returns the direction as a vector.
    #[inline]
    pub fn direction(&self) -> Vector3<f64> {
        Vector3::new(self.xp, self.yp, self.zp)
    }
}

/// Local coordinates plus path length, total energy and statistical weight.
///
/// This is what every distribution produces per call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullLocalCoords {
    /// Horizontal position (m)
    pub x: f64,
    /// Vertical position (m)
    pub y: f64,
    /// Longitudinal position (m)
    pub z: f64,
    /// Horizontal direction component
    pub xp: f64,
    /// Vertical direction component
    pub yp: f64,
    /// Longitudinal direction component
    pub zp: f64,
    /// Arrival time (s)
    pub t: f64,
    /// Path length along the design orbit (m)
    pub s: f64,
    /// Total energy (GeV)
    pub total_energy: f64,
    /// Statistical weight
    pub weight: f64,
}

impl Default for FullLocalCoords {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            xp: 0.0,
            yp: 0.0,
            zp: 1.0,
            t: 0.0,
            s: 0.0,
            total_energy: 0.0,
            weight: 1.0,
        }
    }
}

impl FullLocalCoords {
    /// Returns the local coordinate part.
    #[inline]
    pub fn coords(&self) -> LocalCoords {
        LocalCoords {
            x: self.x,
            y: self.y,
            z: self.z,
            xp: self.xp,
            yp: self.yp,
            zp: self.zp,
            t: self.t,
        }
    }

    /// Squared norm of the direction vector.
    #[inline]
    pub fn direction_norm_squared(&self) -> f64 {
        self.xp * self.xp + self.yp * self.yp + self.zp * self.zp
    }

    /// True if the total energy exceeds `mass`.
    #[inline]
    pub fn is_physical(&self, mass: f64) -> bool {
        self.total_energy > mass
    }

    /// Total momentum for a particle of the given rest mass (GeV/c).
    ///
    /// Returns zero below threshold.
    #[inline]
    pub fn momentum(&self, mass: f64) -> f64 {
        let p2 = self.total_energy * self.total_energy - mass * mass;
        if p2 > 0.0 {
            p2.sqrt()
        } else {
            0.0
        }
    }
}

/// Position, direction and time in the fixed global frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalCoords {
    /// Global x (m)
    pub x: f64,
    /// Global y (m)
    pub y: f64,
    /// Global z (m)
    pub z: f64,
    /// Direction x component
    pub xp: f64,
    /// Direction y component
    pub yp: f64,
    /// Direction z component
    pub zp: f64,
    /// Global time (s)
    pub t: f64,
}

impl GlobalCoords {
    /// Builds global coordinates from a point, a direction and a time.
    #[inline]
    pub fn from_parts(position: Point3<f64>, direction: Vector3<f64>, t: f64) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            xp: direction.x,
            yp: direction.y,
            zp: direction.z,
            t,
        }
    }

    /// Returns the position as a point.
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Returns the direction as a vector.
    #[inline]
    pub fn direction(&self) -> Vector3<f64> {
        Vector3::new(self.xp, self.yp, self.zp)
    }
}

/// One generated particle: local coordinates, global coordinates and the
/// index of the beamline element it starts in (curvilinear path only).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FullGlobalCoords {
    /// Local coordinates (S includes the beamline start offset)
    pub local: FullLocalCoords,
    /// Global coordinates
    pub global: GlobalCoords,
    /// Beamline element index, if resolved through the curvilinear transform
    pub beamline_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_calculate_zp_sign_follows_hint() {
        assert_relative_eq!(calculate_zp(0.3, 0.4, 1.0).unwrap(), 0.866_025_403_784_438_6, epsilon = 1e-12);
        assert_relative_eq!(calculate_zp(0.3, 0.4, -2.0).unwrap(), -0.866_025_403_784_438_6, epsilon = 1e-12);
        assert!(calculate_zp(0.0, 0.0, 0.0).unwrap() > 0.0);
    }

    #[test]
    fn test_calculate_zp_rejects_unit_transverse() {
        assert!(matches!(
            calculate_zp(1.0, 0.0, 1.0),
            Err(GenerationError::InvalidDirection { .. })
        ));
        assert!(calculate_zp(f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_full_local_defaults() {
        let c = FullLocalCoords::default();
        assert_eq!(c.weight, 1.0);
        assert_eq!(c.direction_norm_squared(), 1.0);
    }

    #[test]
    fn test_momentum_below_threshold_is_zero() {
        let c = FullLocalCoords {
            total_energy: 0.5,
            ..FullLocalCoords::default()
        };
        assert_eq!(c.momentum(0.938), 0.0);
        assert!(!c.is_physical(0.938));
    }
}
