//! Structured logging.
//!
//! # Responsibilities
//! - Write every event, timestamped, to the configured log file
//! - Echo operator-facing events (target [`CONSOLE_TARGET`]) to the screen
//!
//! Session traffic stays in the file so it never interleaves with the
//! operator console.

use std::fs::File;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LoggingConfig;

/// Events on this target are also shown on the operator screen.
pub const CONSOLE_TARGET: &str = "console";

/// Errors setting up logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("could not open log file {path} for writing: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("logging already initialized: {0}")]
    Init(String),
}

/// Build the file filter: `RUST_LOG` if set, else the configured directive,
/// always keeping console events.
fn file_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    let base = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| config.filter.clone());
    EnvFilter::try_new(format!("{CONSOLE_TARGET}=info,{base}")).map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Install the global subscriber. Truncates the log file.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let file = File::create(&config.file).map_err(|source| LoggingError::File {
        path: config.file.display().to_string(),
        source,
    })?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(file_filter(config)?);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(Targets::new().with_target(CONSOLE_TARGET, Level::INFO));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_always_keeps_console_target() {
        let config = LoggingConfig {
            filter: "warn".into(),
            ..Default::default()
        };
        let filter = file_filter(&config).unwrap().to_string();
        assert!(filter.contains("console=info"));
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            file: dir.path().join("missing-dir").join("log.log"),
            ..Default::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::File { .. })));
    }
}
