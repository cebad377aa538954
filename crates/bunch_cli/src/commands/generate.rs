//! Generate command implementation
//!
//! Generates a bunch and writes one record per particle as CSV or JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use bunch_core::types::FullGlobalCoords;
use bunch_sampling::parallel::generate_parallel;
use clap::ValueEnum;
use serde::Serialize;
use tracing::info;

use crate::config::CliConfig;
use crate::{CliError, Result};

/// Output encoding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One flat row per particle
    #[default]
    Csv,
    /// Array of local/global coordinate objects
    Json,
}

/// Options of one `generate` invocation
#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    /// Number of particles; `None` takes the replay file length
    pub events: Option<usize>,
    /// Output file, stdout if `None`
    pub output: Option<PathBuf>,
    /// Output encoding
    pub format: OutputFormat,
    /// Seed override
    pub seed: Option<u64>,
    /// Worker count, 0 for one per thread
    pub workers: usize,
}

/// Flat CSV row
#[derive(Debug, Serialize)]
struct ParticleRecord {
    event: usize,
    x: f64,
    y: f64,
    z: f64,
    xp: f64,
    yp: f64,
    zp: f64,
    t: f64,
    s: f64,
    total_energy: f64,
    weight: f64,
    global_x: f64,
    global_y: f64,
    global_z: f64,
    global_xp: f64,
    global_yp: f64,
    global_zp: f64,
    global_t: f64,
    beamline_index: Option<usize>,
}

impl ParticleRecord {
    fn new(event: usize, p: &FullGlobalCoords) -> Self {
        let (l, g) = (&p.local, &p.global);
        Self {
            event,
            x: l.x,
            y: l.y,
            z: l.z,
            xp: l.xp,
            yp: l.yp,
            zp: l.zp,
            t: l.t,
            s: l.s,
            total_energy: l.total_energy,
            weight: l.weight,
            global_x: g.x,
            global_y: g.y,
            global_z: g.z,
            global_xp: g.xp,
            global_yp: g.yp,
            global_zp: g.zp,
            global_t: g.t,
            beamline_index: p.beamline_index,
        }
    }
}

/// Run the generate command
///
/// Returns the number of particles written.
pub fn run(config: &CliConfig, options: &GenerateOptions) -> Result<usize> {
    let reference = config.particle.definition()?;
    let factory = config.factory(options.seed)?;

    let events = match options.events {
        Some(n) => n,
        None => factory
            .build(&reference, &config.beam)?
            .suggested_number_of_events()
            .ok_or_else(|| {
                CliError::invalid_argument(
                    "--events is required unless beam.distr_file_match_length is set",
                )
            })?,
    };
    info!(
        distribution = %config.beam.distr_type,
        events,
        seed = factory.seed(),
        format = ?options.format,
        "Starting generation"
    );

    let bunch = generate_parallel(&factory, &reference, &config.beam, events, options.workers)?;

    match &options.output {
        Some(path) => {
            let file = File::create(path)?;
            write_bunch(BufWriter::new(file), &bunch, options.format)?;
            info!(path = %path.display(), particles = bunch.len(), "Wrote bunch");
        }
        None => write_bunch(io::stdout().lock(), &bunch, options.format)?,
    }
    Ok(bunch.len())
}

/// Writes `bunch` in `format`.
pub fn write_bunch<W: Write>(
    mut writer: W,
    bunch: &[FullGlobalCoords],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut csv = csv::Writer::from_writer(writer);
            for (event, particle) in bunch.iter().enumerate() {
                csv.serialize(ParticleRecord::new(event, particle))?;
            }
            csv.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, bunch)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
