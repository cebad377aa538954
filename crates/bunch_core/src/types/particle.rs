//! Reference particle contract and concrete particle definitions.
//!
//! The bunch generator never owns the design particle. It consumes it through
//! [`ReferenceParticle`], which also supplies the relativistic conversions
//! between energy, momentum and kinetic-energy spreads.

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;
use crate::units::{AMU_C2, GEV_TO_TESLA_METRE};

/// Particle species: PDG code, rest mass (GeV/c²) and charge (units of e).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpecies {
    /// PDG Monte Carlo particle code
    pub pdg_id: i32,
    /// Rest mass (GeV/c²)
    pub mass: f64,
    /// Charge in units of the elementary charge
    pub charge: f64,
}

impl ParticleSpecies {
    /// Proton.
    pub const PROTON: Self = Self::new(2212, 0.938_272_088_16, 1.0);
    /// Antiproton.
    pub const ANTIPROTON: Self = Self::new(-2212, 0.938_272_088_16, -1.0);
    /// Neutron.
    pub const NEUTRON: Self = Self::new(2112, 0.939_565_420_52, 0.0);
    /// Electron.
    pub const ELECTRON: Self = Self::new(11, 0.000_510_998_950, -1.0);
    /// Positron.
    pub const POSITRON: Self = Self::new(-11, 0.000_510_998_950, 1.0);
    /// Negative muon.
    pub const MUON: Self = Self::new(13, 0.105_658_375_5, -1.0);
    /// Positive muon.
    pub const ANTIMUON: Self = Self::new(-13, 0.105_658_375_5, 1.0);
    /// Positive pion.
    pub const PION_PLUS: Self = Self::new(211, 0.139_570_39, 1.0);
    /// Negative pion.
    pub const PION_MINUS: Self = Self::new(-211, 0.139_570_39, -1.0);
    /// Photon.
    pub const PHOTON: Self = Self::new(22, 0.0, 0.0);

    /// Creates a species from its raw properties.
    pub const fn new(pdg_id: i32, mass: f64, charge: f64) -> Self {
        Self {
            pdg_id,
            mass,
            charge,
        }
    }

    /// Resolves a PDG code.
    ///
    /// Nuclear codes of the form `10LZZZAAAI` resolve to a fully stripped ion
    /// with mass `A × u`.
    ///
    /// # Examples
    /// ```
    /// use bunch_core::types::ParticleSpecies;
    ///
    /// assert_eq!(ParticleSpecies::from_pdg(2212), Some(ParticleSpecies::PROTON));
    ///
    /// // Lead-208
    /// let lead = ParticleSpecies::from_pdg(1000822080).unwrap();
    /// assert_eq!(lead.charge, 82.0);
    /// ```
    pub fn from_pdg(pdg_id: i32) -> Option<Self> {
        let species = match pdg_id {
            2212 => Self::PROTON,
            -2212 => Self::ANTIPROTON,
            2112 => Self::NEUTRON,
            11 => Self::ELECTRON,
            -11 => Self::POSITRON,
            13 => Self::MUON,
            -13 => Self::ANTIMUON,
            211 => Self::PION_PLUS,
            -211 => Self::PION_MINUS,
            22 => Self::PHOTON,
            id if id >= 1_000_000_000 => {
                let z = (id / 10_000) % 1000;
                let a = (id / 10) % 1000;
                if a == 0 {
                    return None;
                }
                Self::new(id, f64::from(a) * AMU_C2, f64::from(z))
            }
            _ => return None,
        };
        Some(species)
    }

    /// Resolves a common particle name.
    pub fn from_name(name: &str) -> Option<Self> {
        let species = match name.trim().to_lowercase().as_str() {
            "proton" | "p" => Self::PROTON,
            "antiproton" | "anti_proton" => Self::ANTIPROTON,
            "neutron" => Self::NEUTRON,
            "electron" | "e-" => Self::ELECTRON,
            "positron" | "e+" => Self::POSITRON,
            "mu-" | "muon" => Self::MUON,
            "mu+" | "antimuon" => Self::ANTIMUON,
            "pi+" => Self::PION_PLUS,
            "pi-" => Self::PION_MINUS,
            "gamma" | "photon" => Self::PHOTON,
            _ => return None,
        };
        Some(species)
    }
}

/// Design particle consumed by the bunch generator.
///
/// Implementors provide the primary kinematic quantities; the spread
/// conversions and rigidity have default implementations.
pub trait ReferenceParticle {
    /// Rest mass (GeV/c²).
    fn mass(&self) -> f64;

    /// Charge (e).
    fn charge(&self) -> f64;

    /// Momentum (GeV/c).
    fn momentum(&self) -> f64;

    /// Total energy (GeV).
    fn total_energy(&self) -> f64;

    /// Kinetic energy (GeV).
    fn kinetic_energy(&self) -> f64 {
        self.total_energy() - self.mass()
    }

    /// Relativistic β.
    fn beta(&self) -> f64 {
        let e = self.total_energy();
        if e > 0.0 {
            self.momentum() / e
        } else {
            0.0
        }
    }

    /// Relativistic γ.
    fn gamma(&self) -> f64 {
        let m = self.mass();
        if m > 0.0 {
            self.total_energy() / m
        } else {
            f64::INFINITY
        }
    }

    /// PDG code, zero if unknown.
    fn pdg_id(&self) -> i32 {
        0
    }

    /// Magnetic rigidity Bρ (T·m).
    fn brho(&self) -> f64 {
        let q = self.charge();
        if q == 0.0 {
            f64::INFINITY
        } else {
            self.momentum() * GEV_TO_TESLA_METRE / q
        }
    }

    /// Relative momentum spread from a relative energy spread: σP = σE / β².
    fn sigma_p_from_sigma_e(&self, sigma_e: f64) -> f64 {
        let beta = self.beta();
        sigma_e / (beta * beta)
    }

    /// Relative kinetic energy spread from a relative energy spread: σEk = σE·E/Ek.
    fn sigma_ek_from_sigma_e(&self, sigma_e: f64) -> f64 {
        sigma_e * self.total_energy() / self.kinetic_energy()
    }

    /// Relative energy spread from a relative momentum spread.
    fn sigma_e_from_sigma_p(&self, sigma_p: f64) -> f64 {
        let beta = self.beta();
        sigma_p * beta * beta
    }

    /// Relative energy spread from a relative kinetic energy spread.
    fn sigma_e_from_sigma_ek(&self, sigma_ek: f64) -> f64 {
        sigma_ek * self.kinetic_energy() / self.total_energy()
    }
}

/// Concrete particle: species plus total energy.
///
/// # Examples
/// ```
/// use bunch_core::types::{ParticleDefinition, ParticleSpecies, ReferenceParticle};
///
/// let e = ParticleDefinition::from_kinetic_energy(ParticleSpecies::ELECTRON, 1.0).unwrap();
/// assert!((e.total_energy() - 1.000_510_998_95).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleDefinition {
    species: ParticleSpecies,
    total_energy: f64,
}

impl ParticleDefinition {
    /// Creates a particle from its total energy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` if the energy is below
    /// the rest mass or not positive.
    pub fn from_total_energy(
        species: ParticleSpecies,
        total_energy: f64,
    ) -> Result<Self, ConfigurationError> {
        if !(total_energy > 0.0) || total_energy < species.mass {
            return Err(ConfigurationError::InvalidParameter {
                name: "total_energy",
                value: total_energy,
                reason: format!("must be positive and at least the rest mass {} GeV", species.mass),
            });
        }
        Ok(Self {
            species,
            total_energy,
        })
    }

    /// Creates a particle from its kinetic energy.
    pub fn from_kinetic_energy(
        species: ParticleSpecies,
        kinetic_energy: f64,
    ) -> Result<Self, ConfigurationError> {
        if !(kinetic_energy >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "kinetic_energy",
                value: kinetic_energy,
                reason: "must be non-negative".to_string(),
            });
        }
        Self::from_total_energy(species, kinetic_energy + species.mass)
    }

    /// Creates a particle from its momentum.
    pub fn from_momentum(species: ParticleSpecies, momentum: f64) -> Result<Self, ConfigurationError> {
        if !(momentum >= 0.0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "momentum",
                value: momentum,
                reason: "must be non-negative".to_string(),
            });
        }
        Self::from_total_energy(species, momentum.hypot(species.mass))
    }

    /// Snapshot of any reference particle.
    pub fn from_reference<R: ReferenceParticle + ?Sized>(reference: &R) -> Self {
        Self {
            species: ParticleSpecies::new(reference.pdg_id(), reference.mass(), reference.charge()),
            total_energy: reference.total_energy(),
        }
    }

    /// Returns the species.
    #[inline]
    pub fn species(&self) -> ParticleSpecies {
        self.species
    }

    /// Replaces the species keeping the momentum fixed.
    ///
    /// This is the hook used when a replayed file switches to a different
    /// particle type (e.g. a partially stripped ion).
    pub fn update_species(&mut self, species: ParticleSpecies) {
        let momentum = self.momentum();
        self.species = species;
        self.total_energy = momentum.hypot(species.mass);
    }
}

impl ReferenceParticle for ParticleDefinition {
    fn mass(&self) -> f64 {
        self.species.mass
    }

    fn charge(&self) -> f64 {
        self.species.charge
    }

    fn momentum(&self) -> f64 {
        let m = self.species.mass;
        (self.total_energy * self.total_energy - m * m).max(0.0).sqrt()
    }

    fn total_energy(&self) -> f64 {
        self.total_energy
    }

    fn pdg_id(&self) -> i32 {
        self.species.pdg_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_proton_kinematics() {
        let p = ParticleDefinition::from_momentum(ParticleSpecies::PROTON, 1.0).unwrap();
        assert_relative_eq!(p.momentum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.beta() * p.gamma() * p.mass(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.brho(), 3.335_640_95, epsilon = 1e-6);
    }

    #[test]
    fn test_below_mass_rejected() {
        let err = ParticleDefinition::from_total_energy(ParticleSpecies::PROTON, 0.5).unwrap_err();
        assert!(err.to_string().contains("total_energy"));
    }

    #[test]
    fn test_spread_conversions_round_trip() {
        let p = ParticleDefinition::from_kinetic_energy(ParticleSpecies::PROTON, 0.2).unwrap();
        let sigma_e = 1e-3;
        let sigma_p = p.sigma_p_from_sigma_e(sigma_e);
        let sigma_ek = p.sigma_ek_from_sigma_e(sigma_e);
        assert!(sigma_p > sigma_e);
        assert!(sigma_ek > sigma_e);
        assert_relative_eq!(p.sigma_e_from_sigma_p(sigma_p), sigma_e, epsilon = 1e-15);
        assert_relative_eq!(p.sigma_e_from_sigma_ek(sigma_ek), sigma_e, epsilon = 1e-15);
    }

    #[test]
    fn test_update_species_keeps_momentum() {
        let mut p = ParticleDefinition::from_momentum(ParticleSpecies::PROTON, 450.0).unwrap();
        let ion = ParticleSpecies::from_pdg(1000822080).unwrap();
        p.update_species(ion);
        assert_relative_eq!(p.momentum(), 450.0, epsilon = 1e-9);
        assert_eq!(p.pdg_id(), 1000822080);
    }

    #[test]
    fn test_species_lookup() {
        assert_eq!(ParticleSpecies::from_name("e-"), Some(ParticleSpecies::ELECTRON));
        assert_eq!(ParticleSpecies::from_pdg(999), None);
        let carbon = ParticleSpecies::from_pdg(1000060120).unwrap();
        assert_eq!(carbon.charge, 6.0);
        assert_relative_eq!(carbon.mass, 12.0 * AMU_C2, epsilon = 1e-12);
    }
}
