//! Configuration schema.
//!
//! Every section rejects unknown fields, so a typo in a file is an error
//! rather than a silently ignored setting.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use hermes_telemetry::{create_env_filter, LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// How handlers receive their arguments and how results are shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Two positional arguments, raw results.
    Simple,
    /// Arguments bound by name, raw results.
    Kwargs,
    /// Arguments bound by name inside request and response envelopes.
    #[default]
    Wraps,
}

impl DispatchMode {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Kwargs => "kwargs",
            Self::Wraps => "wraps",
        }
    }
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "kwargs" => Ok(Self::Kwargs),
            "wraps" => Ok(Self::Wraps),
            other => Err(format!("unknown mode '{other}', expected simple, kwargs or wraps")),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listener and dispatch settings.
    pub service: ServiceSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

/// `[service]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceSection {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Dispatch mode.
    pub mode: DispatchMode,
    /// Seconds to wait for open connections on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Seconds a client may take to send a request body.
    pub body_timeout_secs: u64,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            mode: DispatchMode::default(),
            shutdown_timeout_secs: 30,
            body_timeout_secs: 30,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Include source file and line.
    pub file_line_info: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            file_line_info: false,
        }
    }
}

impl ServiceConfig {
    /// Returns `host:port`.
    #[must_use]
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }

    /// Returns the shutdown timeout.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_secs)
    }

    /// Returns the body read timeout.
    #[must_use]
    pub const fn body_timeout(&self) -> Duration {
        Duration::from_secs(self.service.body_timeout_secs)
    }

    /// Builds the logging configuration.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.logging.level.clone(),
            format: self.logging.format,
            file_line_info: self.logging.file_line_info,
            with_target: true,
            service_name: format!("hermes-{}", self.service.mode),
        }
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let addr = self.http_addr();
        if addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "service.host",
                format!("'{addr}' is not a socket address"),
            ));
        }

        if self.service.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "service.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.service.body_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "service.body_timeout_secs",
                "must be greater than zero",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }
        if let Err(e) = create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.http_addr(), "0.0.0.0:5000");
        assert_eq!(config.service.mode, DispatchMode::Wraps);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Kwargs".parse::<DispatchMode>().unwrap(), DispatchMode::Kwargs);
        assert_eq!("simple".parse::<DispatchMode>().unwrap(), DispatchMode::Simple);
        assert!("decorated".parse::<DispatchMode>().is_err());
        assert_eq!(DispatchMode::Wraps.to_string(), "wraps");
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let mut config = ServiceConfig::default();
        config.service.host = "not a host".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("service.host"));
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = ServiceConfig::default();
        config.service.body_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.service.shutdown_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        let mut config = ServiceConfig::default();
        config.logging.level = "  ".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "hermes=loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_log_config() {
        let mut config = ServiceConfig::default();
        config.service.mode = DispatchMode::Kwargs;
        config.logging.level = "debug".to_string();

        let log = config.to_log_config();
        assert_eq!(log.level, "debug");
        assert_eq!(log.service_name, "hermes-kwargs");
    }
}
