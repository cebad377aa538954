//! `bunch` - beam bunch generation from the command line.

use std::io;
use std::path::PathBuf;

use bunch_cli::commands::{self, generate::GenerateOptions, generate::OutputFormat};
use bunch_cli::config::{CliConfig, LogLevel};
use bunch_cli::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Beam bunch generator
#[derive(Parser)]
#[command(name = "bunch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "bunch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a bunch
    Generate {
        /// Number of particles (defaults to the replay file length)
        #[arg(short = 'n', long)]
        events: Option<usize>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Seed override
        #[arg(short, long)]
        seed: Option<u64>,

        /// Worker count, 0 for one per thread
        #[arg(short, long, default_value = "0")]
        workers: usize,
    },

    /// Validate the configuration
    Check,

    /// Follow one primary through the one-turn map
    Map {
        /// Number of turns
        #[arg(short, long, default_value = "10")]
        turns: u32,

        /// Seed override
        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(&cli.config)?.with_env_override()?;
    init_tracing(if cli.verbose {
        LogLevel::Debug
    } else {
        config.log_level
    });
    info!(config = %cli.config.display(), "Loaded configuration");

    match cli.command {
        Commands::Generate {
            events,
            output,
            format,
            seed,
            workers,
        } => {
            let options = GenerateOptions {
                events,
                output,
                format,
                seed,
                workers,
            };
            commands::generate::run(&config, &options)?;
        }
        Commands::Check => {
            let report = commands::check::run(&config)?;
            print!("{report}");
        }
        Commands::Map { turns, seed } => {
            let records = commands::map::run(&config, turns, seed)?;
            commands::map::write_turns(io::stdout().lock(), &records)?;
        }
    }
    Ok(())
}
