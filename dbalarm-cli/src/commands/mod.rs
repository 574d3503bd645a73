//! Command handlers -- one module per subcommand

pub mod alarms;
pub mod config;
pub mod detect;
