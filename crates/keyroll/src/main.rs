//! keyroll - MIDI note timeline tool for keyboard replay
//!
//! Subcommands:
//! - `keyroll analyze <file>` - Print the timed note events and range summary
//! - `keyroll tracks <file>` - List tracks with names and note counts
//! - `keyroll export <file> --output <path>` - Write the timeline as CSV or JSON
//! - `keyroll groups` - Show the register group table
//! - `keyroll config` - Show the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use keyconf::KeyrollConfig;
use std::path::PathBuf;

mod args;
mod commands;

use args::AnalysisArgs;

#[derive(Parser)]
#[command(name = "keyroll")]
#[command(about = "Inspect and export the note timeline of MIDI files")]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./keyroll.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a MIDI file and print its events
    Analyze {
        /// MIDI file
        file: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Print the whole analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the tracks of a MIDI file
    Tracks {
        /// MIDI file
        file: PathBuf,

        /// Include tracks below the configured note threshold
        #[arg(short, long)]
        all: bool,
    },

    /// Export the event timeline to a file
    Export {
        /// MIDI file
        file: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Show the register groups and their note ranges
    Groups,

    /// Show the effective configuration and where it came from
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = KeyrollConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG already folded into log_level by the config loader
    let filter = tracing_subscriber::EnvFilter::try_new(&config.telemetry.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        files = sources.files.len(),
        env_overrides = sources.env_overrides.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Analyze {
            file,
            analysis,
            json,
        } => {
            commands::analyze(&file, &analysis, json, &config)?;
        }
        Commands::Tracks { file, all } => {
            commands::tracks(&file, all, &config)?;
        }
        Commands::Export {
            file,
            output,
            format,
            analysis,
        } => {
            commands::export(&file, &analysis, &output, format, &config)?;
        }
        Commands::Groups => {
            commands::groups()?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources)?;
        }
    }

    Ok(())
}
