//! dbalarm — TESS ingestion-log alarm tool.
//!
//! Scans tessdb ingestion logs for the zero-readings failure signature,
//! records alarms in SQLite, and sends batched email notifications with
//! at-least-once delivery.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use dbalarm_core::config::DbAlarmConfig;

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match &e {
                CliError::Interrupted => error!("interrupted, shutting down"),
                _ => error!(error = %e, "command failed"),
            }
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = DbAlarmConfig::load(&cli.config).await?;
    logging::init_tracing(&config.general, cli.log_level.as_deref())?;

    info!(config = %cli.config.display(), "dbalarm starting");

    let writer = OutputWriter::new(cli.output);

    tokio::select! {
        result = dispatch(cli.command, &config, &cli.config, &writer) => result,
        _ = tokio::signal::ctrl_c() => Err(CliError::Interrupted),
    }
}

async fn dispatch(
    command: Commands,
    config: &DbAlarmConfig,
    config_path: &std::path::Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match command {
        Commands::Detect(args) => commands::detect::execute(args, config, writer).await,
        Commands::Alarms(args) => commands::alarms::execute(args, config, writer).await,
        Commands::Config(args) => commands::config::execute(args.action, config, config_path, writer),
    }
}
