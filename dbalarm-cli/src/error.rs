//! CLI-specific error types and exit code mapping

use dbalarm_core::error::DbAlarmError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Alarm store operation failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Notification delivery setup or send failed.
    #[error("notification error: {0}")]
    Notify(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Interrupted by the user (Ctrl-C).
    #[error("interrupted by user")]
    Interrupted,
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                    |
    /// |------|----------------------------|
    /// | 0    | Success                    |
    /// | 1    | General / command error    |
    /// | 2    | Configuration error        |
    /// | 3    | Storage error              |
    /// | 4    | Notification error         |
    /// | 10   | IO error                   |
    /// | 130  | Interrupted by user        |
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Storage(_) => 3,
            Self::Notify(_) => 4,
            Self::Io(_) => 10,
            Self::Interrupted => 130,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<DbAlarmError> for CliError {
    fn from(e: DbAlarmError) -> Self {
        match e {
            DbAlarmError::Config(e) => Self::Config(e.to_string()),
            DbAlarmError::Storage(e) => Self::Storage(e.to_string()),
            DbAlarmError::Notify(e) => Self::Notify(e.to_string()),
            DbAlarmError::Io(e) => Self::Io(e),
            DbAlarmError::Pattern(e) => Self::Command(e),
        }
    }
}
