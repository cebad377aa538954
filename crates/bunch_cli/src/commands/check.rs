//! Check command implementation

use std::fmt;

use bunch_sampling::bunch::LocalDistribution;
use tracing::info;

use crate::config::CliConfig;
use crate::Result;

/// Summary of a validated configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// Distribution tag
    pub distribution: String,
    /// PDG code of the reference particle
    pub pdg_id: i32,
    /// Bunch centre total energy (GeV)
    pub reference_energy: f64,
    /// Relative total energy spread
    pub sigma_e: f64,
    /// True if particles are placed through the beamline (`s0` past its start)
    pub curvilinear: bool,
    /// Entries of the replay file, if file based
    pub file_entries: Option<usize>,
    /// Term count of the one-turn map, if configured
    pub map_terms: Option<usize>,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "distribution:     {}", self.distribution)?;
        writeln!(f, "particle (PDG):   {}", self.pdg_id)?;
        writeln!(f, "reference energy: {} GeV", self.reference_energy)?;
        writeln!(f, "energy spread:    {}", self.sigma_e)?;
        writeln!(
            f,
            "placement:        {}",
            if self.curvilinear { "curvilinear" } else { "flat" }
        )?;
        if let Some(n) = self.file_entries {
            writeln!(f, "file entries:     {n}")?;
        }
        if let Some(n) = self.map_terms {
            writeln!(f, "one-turn map:     {n} terms")?;
        }
        Ok(())
    }
}

/// Run the check command
///
/// Validates the configuration, then builds and initialises a sampler
/// (loading any replay or map file) without generating particles.
pub fn run(config: &CliConfig) -> Result<CheckReport> {
    config.validate()?;

    let reference = config.particle.definition()?;
    let factory = config.factory(None)?;
    let sampler = factory.build(&reference, &config.beam)?;
    let map = factory.build_one_turn_map(&reference, &config.beam)?;

    let report = CheckReport {
        distribution: config.beam.distr_type.clone(),
        pdg_id: reference.species().pdg_id,
        reference_energy: sampler.centre().e0,
        sigma_e: sampler.centre().sigma_e,
        curvilinear: sampler.engine().uses_curvilinear(),
        file_entries: sampler.distribution().file_entries(),
        map_terms: map.as_ref().map(|m| m.table().len()),
    };
    info!(distribution = %report.distribution, "Configuration is valid");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliError;

    #[test]
    fn test_check_reports_flat_gauss() {
        let config = CliConfig::from_toml(
            "inline",
            r#"
            [particle]
            name = "proton"
            total_energy = 6500.0

            [beam]
            distr_type = "gauss"
            sigma_x = 1e-4
            sigma_y = 1e-4
            sigma_e = 1e-4
            "#,
        )
        .unwrap();

        let report = run(&config).unwrap();
        assert_eq!(report.distribution, "gauss");
        assert_eq!(report.reference_energy, 6500.0);
        assert_eq!(report.pdg_id, 2212);
        assert_eq!(report.sigma_e, 1e-4);
        assert!(!report.curvilinear);
        assert_eq!(report.file_entries, None);
        assert_eq!(report.map_terms, None);
        assert!(report.to_string().contains("flat"));
    }

    #[test]
    fn test_check_with_beamline_is_curvilinear() {
        let config = CliConfig::from_toml(
            "inline",
            r#"
            [particle]
            total_energy = 100.0

            [beam]
            distr_type = "reference"
            s0 = 2.0

            [[beamline.elements]]
            name = "d1"
            length = 10.0
            "#,
        )
        .unwrap();

        assert!(run(&config).unwrap().curvilinear);
    }

    #[test]
    fn test_check_rejects_unknown_distribution() {
        let config = CliConfig::from_toml(
            "inline",
            r#"
            [particle]
            total_energy = 100.0

            [beam]
            distr_type = "banana"
            "#,
        )
        .unwrap();

        assert!(matches!(run(&config), Err(CliError::Config(_))));
    }
}
