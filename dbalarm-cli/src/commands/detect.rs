//! `dbalarm detect` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use dbalarm_core::config::DbAlarmConfig;
use dbalarm_engine::{AlarmStore, ReconcileEngine, SmtpNotifier};

use crate::cli::DetectArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `detect` command.
///
/// Runs one reconciliation pass: flush previously pending alarms, then
/// detect and record new ones from the given log file.
pub async fn execute(
    args: DetectArgs,
    config: &DbAlarmConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    // Read the input up front: a missing or unreadable log file is fatal
    // and must not mutate any state.
    let content = tokio::fs::read_to_string(&args.file).await.map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", args.file.display()),
        ))
    })?;

    let store =
        AlarmStore::open(&config.database.path).map_err(|e| CliError::Storage(e.to_string()))?;
    let notifier =
        SmtpNotifier::from_config(&config.smtp).map_err(|e| CliError::Notify(e.to_string()))?;
    let mut engine = ReconcileEngine::new(store, notifier)?;

    info!(file = %args.file.display(), "starting detection pass");
    let run = engine.run(content.lines()).await?;

    let report = DetectReport {
        file: args.file.display().to_string(),
        lines_scanned: run.lines_scanned,
        detections: run.detections,
        already_known: run.already_known,
        new_alarms: run.new_alarms,
        new_alarms_notified: run.new_alarms_notified,
        flushed: run.flushed,
        pending_after: run.pending_after,
    };
    writer.render(&report)?;

    Ok(())
}

#[derive(Serialize)]
pub struct DetectReport {
    pub file: String,
    pub lines_scanned: usize,
    pub detections: usize,
    pub already_known: usize,
    pub new_alarms: Vec<String>,
    pub new_alarms_notified: bool,
    pub flushed: usize,
    pub pending_after: usize,
}

impl Render for DetectReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Detect: {}", self.file.bold())?;
        writeln!(w, "Lines scanned: {}", self.lines_scanned)?;
        writeln!(
            w,
            "Detections: {} ({} already known)",
            self.detections, self.already_known
        )?;

        if self.new_alarms.is_empty() {
            writeln!(w, "{}", "No new alarms.".green())?;
        } else {
            let status = if self.new_alarms_notified {
                "notified".green()
            } else {
                "pending".yellow()
            };
            writeln!(w, "New alarms ({}):", status)?;
            for alarm in &self.new_alarms {
                writeln!(w, "  - {alarm}")?;
            }
        }

        if self.flushed > 0 {
            writeln!(w, "Flushed pending alarms: {}", self.flushed)?;
        }
        if self.pending_after > 0 {
            let note = format!(
                "{} alarm(s) still pending, will retry on next run",
                self.pending_after
            );
            writeln!(w, "{}", note.yellow())?;
        }

        Ok(())
    }
}
