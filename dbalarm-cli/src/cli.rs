//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// dbalarm -- ingestion-failure alarm tool.
///
/// Use `dbalarm <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "dbalarm", version, about, long_about = None)]
pub struct Cli {
    /// Path to the dbalarm.toml configuration file.
    #[arg(short, long, default_value = "dbalarm.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one detection pass over an ingestion log file.
    Detect(DetectArgs),

    /// List stored alarms and their notification status.
    Alarms(AlarmsArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- detect ----

/// Run one detection and notification pass.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Input log file to analyze.
    #[arg(short, long)]
    pub file: PathBuf,
}

// ---- alarms ----

/// List stored alarms.
#[derive(Args, Debug)]
pub struct AlarmsArgs {
    /// Show only alarms awaiting delivery confirmation.
    #[arg(short, long)]
    pub pending: bool,
}

// ---- config ----

/// Manage dbalarm configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, database, smtp).
        #[arg(long)]
        section: Option<String>,
    },
}
