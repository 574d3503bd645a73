//! `dbalarm alarms` command handler

use std::io::Write;

use serde::Serialize;

use dbalarm_core::Alarm;
use dbalarm_core::config::DbAlarmConfig;
use dbalarm_engine::AlarmStore;

use crate::cli::AlarmsArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `alarms` command.
pub async fn execute(
    args: AlarmsArgs,
    config: &DbAlarmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let store =
        AlarmStore::open(&config.database.path).map_err(|e| CliError::Storage(e.to_string()))?;
    let mut alarms = store
        .alarms()
        .map_err(|e| CliError::Storage(e.to_string()))?;

    if args.pending {
        alarms.retain(Alarm::is_pending);
    }

    let pending = alarms.iter().filter(|a| a.is_pending()).count();
    let report = AlarmList {
        total: alarms.len(),
        pending,
        pending_only: args.pending,
        alarms,
    };
    writer.render(&report)?;

    Ok(())
}

#[derive(Serialize)]
pub struct AlarmList {
    pub total: usize,
    pub pending: usize,
    pub pending_only: bool,
    pub alarms: Vec<Alarm>,
}

impl Render for AlarmList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.alarms.is_empty() {
            if self.pending_only {
                writeln!(w, "{}", "No pending alarms.".green())?;
            } else {
                writeln!(w, "No alarms recorded.")?;
            }
            return Ok(());
        }

        writeln!(w, "{:<26} {:<10} {}", "DETECTED", "STATUS", "NOTIFIED")?;
        for alarm in &self.alarms {
            let (status, notified) = match &alarm.notified_at {
                Some(at) => ("notified".green(), at.as_str()),
                None => ("pending".yellow(), "-"),
            };
            writeln!(w, "{:<26} {:<10} {}", alarm.detected_at, status, notified)?;
        }
        writeln!(w, "\nTotal: {} ({} pending)", self.total, self.pending)?;

        Ok(())
    }
}
