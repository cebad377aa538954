//! Central coordinates and derived spreads shared by every distribution.

use bunch_core::types::{
    calculate_zp, ConfigurationError, FullLocalCoords, ParticleDefinition, ParticleSpecies,
    ReferenceParticle,
};

use crate::config::BeamDefinition;

/// Centre of the bunch plus the energy spreads in all three conventions.
///
/// Built once by [`BunchCentre::configure`]. The energy and spread groups are
/// mutually exclusive: at most one of `e0`, `ek0`, `p0` and at most one of
/// `sigma_e`, `sigma_p`, `sigma_ek` may be set (non-zero). Unset centre
/// energy falls back to the reference particle.
#[derive(Clone, Debug, PartialEq)]
pub struct BunchCentre {
    /// Horizontal offset (m)
    pub x0: f64,
    /// Vertical offset (m)
    pub y0: f64,
    /// Longitudinal offset (m)
    pub z0: f64,
    /// Curvilinear start position (m)
    pub s0: f64,
    /// Horizontal direction component
    pub xp0: f64,
    /// Vertical direction component
    pub yp0: f64,
    /// Longitudinal direction component, back-derived from `xp0`, `yp0`
    pub zp0: f64,
    /// Time offset (s)
    pub t0: f64,
    /// Central total energy (GeV)
    pub e0: f64,
    /// Species of the design particle
    pub species: ParticleSpecies,
    /// Rest mass of the design particle (GeV)
    pub mass: f64,
    /// Relative total energy spread
    pub sigma_e: f64,
    /// Relative momentum spread
    pub sigma_p: f64,
    /// Relative kinetic energy spread
    pub sigma_ek: f64,
    /// Time spread (s)
    pub sigma_t: f64,
}

impl BunchCentre {
    /// Reads the centre from a beam definition.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::ConflictingParameters`] if an exclusive group
    ///   is over-specified, naming the keys that were set
    /// - [`ConfigurationError::InvalidParameter`] if the centre energy is
    ///   below the rest mass, a spread is negative, or `xp0² + yp0² ≥ 1`
    pub fn configure<R: ReferenceParticle + ?Sized>(
        reference: &R,
        definition: &BeamDefinition,
    ) -> Result<Self, ConfigurationError> {
        let energy_keys = set_keys(&[
            ("e0", definition.e0),
            ("ek0", definition.ek0),
            ("p0", definition.p0),
        ]);
        if energy_keys.len() > 1 {
            return Err(ConfigurationError::ConflictingParameters { keys: energy_keys });
        }
        let spread_keys = set_keys(&[
            ("sigma_e", definition.sigma_e),
            ("sigma_p", definition.sigma_p),
            ("sigma_ek", definition.sigma_ek),
        ]);
        if spread_keys.len() > 1 {
            return Err(ConfigurationError::ConflictingParameters { keys: spread_keys });
        }

        let species =
            ParticleSpecies::new(reference.pdg_id(), reference.mass(), reference.charge());
        let particle = match energy_keys.first().copied() {
            Some("e0") => ParticleDefinition::from_total_energy(species, definition.e0)?,
            Some("ek0") => ParticleDefinition::from_kinetic_energy(species, definition.ek0)?,
            Some(_) => ParticleDefinition::from_momentum(species, definition.p0)?,
            None => ParticleDefinition::from_reference(reference),
        };

        for (name, value) in [
            ("sigma_e", definition.sigma_e),
            ("sigma_p", definition.sigma_p),
            ("sigma_ek", definition.sigma_ek),
            ("sigma_t", definition.sigma_t),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigurationError::InvalidParameter {
                    name,
                    value,
                    reason: "spread must be finite and non-negative".to_string(),
                });
            }
        }

        let kinetic = particle.kinetic_energy();
        let sigma_e = match spread_keys.first().copied() {
            Some("sigma_p") => particle.sigma_e_from_sigma_p(definition.sigma_p),
            Some("sigma_ek") if kinetic > 0.0 => particle.sigma_e_from_sigma_ek(definition.sigma_ek),
            Some("sigma_ek") => {
                return Err(ConfigurationError::InvalidParameter {
                    name: "sigma_ek",
                    value: definition.sigma_ek,
                    reason: "kinetic energy spread needs a non-zero kinetic energy".to_string(),
                })
            }
            _ => definition.sigma_e,
        };
        let sigma_p = if particle.beta() > 0.0 {
            particle.sigma_p_from_sigma_e(sigma_e)
        } else {
            0.0
        };
        let sigma_ek = if kinetic > 0.0 {
            particle.sigma_ek_from_sigma_e(sigma_e)
        } else {
            0.0
        };

        let zp0 = calculate_zp(definition.xp0, definition.yp0, definition.zp0).map_err(|_| {
            ConfigurationError::InvalidParameter {
                name: "xp0",
                value: definition.xp0,
                reason: format!(
                    "xp0^2 + yp0^2 must be below 1 (yp0 = {})",
                    definition.yp0
                ),
            }
        })?;

        Ok(Self {
            x0: definition.x0,
            y0: definition.y0,
            z0: definition.z0,
            s0: definition.s0,
            xp0: definition.xp0,
            yp0: definition.yp0,
            zp0,
            t0: definition.t0,
            e0: particle.total_energy(),
            species,
            mass: particle.mass(),
            sigma_e,
            sigma_p,
            sigma_ek,
            sigma_t: definition.sigma_t,
        })
    }

    /// Path length of a particle at longitudinal offset `z`.
    #[inline]
    pub fn s_at(&self, z: f64) -> f64 {
        self.s0 + z
    }

    /// Centre as a full coordinate set with unit weight.
    pub fn coords(&self) -> FullLocalCoords {
        FullLocalCoords {
            x: self.x0,
            y: self.y0,
            z: self.z0,
            xp: self.xp0,
            yp: self.yp0,
            zp: self.zp0,
            t: self.t0,
            s: self.s_at(self.z0),
            total_energy: self.e0,
            weight: 1.0,
        }
    }
}

/// Keys of the group whose value counts as set.
fn set_keys(group: &[(&'static str, f64)]) -> Vec<&'static str> {
    group
        .iter()
        .filter(|(_, value)| *value != 0.0)
        .map(|(key, _)| *key)
        .collect()
}
