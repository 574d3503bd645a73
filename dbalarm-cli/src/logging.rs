//! Logging initialization for the dbalarm CLI.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `DbAlarmConfig`, with an optional CLI-level override. Supports
//! JSON structured logging and human-readable pretty format.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use dbalarm_core::config::GeneralConfig;

use crate::error::CliError;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// All components receive the capability through this one process-wide
/// initialisation; nothing reconfigures logging afterwards.
///
/// # Arguments
///
/// * `config` - General configuration (log_level, log_format)
/// * `level_override` - CLI `--log-level` flag, takes precedence over config
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (for scheduler-driven runs)
/// * `"pretty"` - Human-readable output (for interactive use)
pub fn init_tracing(config: &GeneralConfig, level_override: Option<&str>) -> Result<(), CliError> {
    let level = level_override.unwrap_or(&config.log_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .map_err(|e| {
                    CliError::Command(format!("failed to initialize JSON tracing subscriber: {e}"))
                })?;
        }
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .map_err(|e| {
                    CliError::Command(format!(
                        "failed to initialize pretty tracing subscriber: {e}"
                    ))
                })?;
        }
        other => {
            return Err(CliError::Config(format!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            )));
        }
    }

    Ok(())
}
