//! Telemetry error types.

use thiserror::Error;

/// Errors raised while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The subscriber could not be installed, usually because one already is.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The log level or filter directive does not parse.
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected directive.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// Unknown log format name.
    #[error("unknown log format '{0}', expected 'json' or 'pretty'")]
    UnknownFormat(String),
}
