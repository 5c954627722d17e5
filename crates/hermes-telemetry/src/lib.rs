//! # Hermes Telemetry
//!
//! Logging setup for Hermes services: a global `tracing` subscriber with an
//! `EnvFilter` and JSON or pretty output.
//!
//! ```rust,no_run
//! use hermes_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! # Ok::<(), hermes_telemetry::TelemetryError>(())
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
