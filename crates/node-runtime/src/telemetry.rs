//! # Logging
//!
//! Installs the process-wide `tracing` subscriber. `RUST_LOG` wins over the
//! configured level when set, so operators can raise verbosity of a single
//! subsystem (`RUST_LOG=ocr_04_transmission=debug`) without a config change.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `ocr_05_supervisor=debug,info`.
    pub level: String,
    /// Emit one JSON object per line instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Logging initialization errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive does not parse.
    #[error("Invalid log filter {directive:?}: {reason}")]
    InvalidFilter {
        /// Directive as configured
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Install the global subscriber.
///
/// Fails instead of panicking when called a second time.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
            directive: config.level.clone(),
            reason: e.to_string(),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}
