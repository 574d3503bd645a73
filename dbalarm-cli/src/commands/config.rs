//! `dbalarm config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use dbalarm_core::config::DbAlarmConfig;

use crate::cli::ConfigAction;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
///
/// The configuration is already loaded (and therefore validated) by the
/// caller; `validate` only needs to report success, `show` renders the
/// effective values with secrets redacted.
pub fn execute(
    action: ConfigAction,
    config: &DbAlarmConfig,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match action {
        ConfigAction::Validate => {
            let report = ValidateReport {
                path: config_path.display().to_string(),
                valid: true,
                recipients: config.smtp.recipient_list().len(),
            };
            writer.render(&report)
        }
        ConfigAction::Show { section } => {
            let report = ConfigReport::redacted(config, section.as_deref())?;
            writer.render(&report)
        }
    }
}

#[derive(Serialize)]
pub struct ValidateReport {
    pub path: String,
    pub valid: bool,
    pub recipients: usize,
}

impl Render for ValidateReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{}: {}", self.path, "valid".green())?;
        writeln!(w, "Notification recipients: {}", self.recipients)?;
        Ok(())
    }
}

/// Effective configuration rendered as TOML with secrets redacted.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub section: Option<String>,
    pub rendered: String,
}

impl ConfigReport {
    fn redacted(config: &DbAlarmConfig, section: Option<&str>) -> Result<Self, CliError> {
        let mut redacted = config.clone();
        if !redacted.smtp.password.is_empty() {
            redacted.smtp.password = "<redacted>".to_owned();
        }

        let rendered = match section {
            None => toml::to_string_pretty(&redacted),
            Some("general") => toml::to_string_pretty(&redacted.general),
            Some("database") => toml::to_string_pretty(&redacted.database),
            Some("smtp") => toml::to_string_pretty(&redacted.smtp),
            Some(other) => {
                return Err(CliError::Command(format!(
                    "unknown config section '{other}' (expected general, database, smtp)"
                )));
            }
        }
        .map_err(|e| CliError::Command(format!("failed to render configuration: {e}")))?;

        Ok(Self {
            section: section.map(str::to_owned),
            rendered,
        })
    }
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        write!(w, "{}", self.rendered)
    }
}
