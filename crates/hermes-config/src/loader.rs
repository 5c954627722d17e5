//! Layered configuration loading.
//!
//! Layers apply in call order and later layers win:
//!
//! 1. Built-in defaults
//! 2. A TOML or JSON file (fields it leaves out take their defaults)
//! 3. A `.env` file
//! 4. Process environment
//!
//! `SERVICE_HOST` and `SERVICE_PORT` are read verbatim. Every other key
//! uses `HERMES__<SECTION>__<KEY>`, e.g. `HERMES__LOGGING__LEVEL=debug`.

use std::fs;
use std::path::Path;

use crate::{ConfigError, ServiceConfig};

/// Prefix of structured environment overrides.
pub const ENV_PREFIX: &str = "HERMES";

/// Builds a [`ServiceConfig`] from layered sources.
///
/// # Example
///
/// ```
/// use hermes_config::{ConfigLoader, DispatchMode};
///
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_string("[service]\nmode = \"kwargs\"\nport = 8080", "toml")?
///     .with_env_vars([("SERVICE_HOST", "127.0.0.1")])?
///     .load()?;
///
/// assert_eq!(config.service.mode, DispatchMode::Kwargs);
/// assert_eq!(config.http_addr(), "127.0.0.1:8080");
/// # Ok::<(), hermes_config::ConfigError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: ServiceConfig,
}

impl ConfigLoader {
    /// Creates a loader holding the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets to the defaults.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ServiceConfig::default();
        self
    }

    /// Loads a `.toml` or `.json` file, picking the parser by extension.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the given format (`"toml"` or `"json"`).
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Applies the `.env` file found from the working directory upwards,
    /// if there is one.
    ///
    /// The file's variables are applied as overrides; the process
    /// environment is not modified.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv_iter() {
            Ok(iter) => self.with_dotenv_iter(iter),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies a specific `.env` file.
    pub fn with_dotenv_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let iter = dotenvy::from_path_iter(path.as_ref())?;
        self.with_dotenv_iter(iter)
    }

    fn with_dotenv_iter(
        self,
        iter: impl Iterator<Item = Result<(String, String), dotenvy::Error>>,
    ) -> Result<Self, ConfigError> {
        let vars = iter.collect::<Result<Vec<_>, _>>()?;
        self.with_env_vars(vars)
    }

    /// Applies overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_vars(std::env::vars())
    }

    /// Applies overrides from explicit key/value pairs.
    ///
    /// Keys that are not configuration keys are ignored.
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            self.apply_env_var(key.as_ref(), value.as_ref())?;
        }
        Ok(self)
    }

    /// Validates and returns the configuration.
    pub fn load(self) -> Result<ServiceConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without validating it.
    #[must_use]
    pub fn load_unvalidated(self) -> ServiceConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let path: Vec<&str> = match key {
            "SERVICE_HOST" => vec!["SERVICE", "HOST"],
            "SERVICE_PORT" => vec!["SERVICE", "PORT"],
            _ => match key.strip_prefix(ENV_PREFIX).and_then(|k| k.strip_prefix("__")) {
                Some(rest) => rest.split("__").collect(),
                None => return Ok(()),
            },
        };

        let service = &mut self.config.service;
        let logging = &mut self.config.logging;
        match path.as_slice() {
            ["SERVICE", "HOST"] => service.host = value.to_string(),
            ["SERVICE", "PORT"] => service.port = parse_number(key, value)?,
            ["SERVICE", "MODE"] => {
                service.mode = value.parse().map_err(|e: String| ConfigError::env_parse(key, e))?;
            }
            ["SERVICE", "SHUTDOWN_TIMEOUT_SECS"] => {
                service.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVICE", "BODY_TIMEOUT_SECS"] => service.body_timeout_secs = parse_number(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                logging.format = value
                    .parse()
                    .map_err(|_| ConfigError::env_parse(key, "expected 'json' or 'pretty'"))?;
            }
            ["LOGGING", "FILE_LINE_INFO"] => {
                logging.file_line_info =
                    parse_bool(value).ok_or_else(|| ConfigError::env_parse(key, "expected boolean"))?;
            }
            _ => {}
        }
        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<ServiceConfig, ConfigError> {
    match format.to_ascii_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse(key, format!("expected an integer, got '{value}'")))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DispatchMode;
    use hermes_telemetry::LogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults_load() {
        let config = ConfigLoader::new().with_defaults().load().unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [service]
            port = 8081
            mode = "simple"

            [logging]
            level = "debug"
            format = "pretty"
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.service.port, 8081);
        assert_eq!(config.service.host, "0.0.0.0");
        assert_eq!(config.service.mode, DispatchMode::Simple);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"service": {{"mode": "kwargs"}}}}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.service.mode, DispatchMode::Kwargs);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConfigLoader::new()
            .with_string("[service]\nprot = 1", "toml")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(err.to_string().contains("prot"));

        let err = ConfigLoader::new()
            .with_string(r#"{"extra": {}}"#, "json")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            ConfigLoader::new().with_file(&path),
            Err(ConfigError::FileNotFound { .. })
        ));
        assert!(ConfigLoader::new().with_optional_file(&path).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::new()
            .with_env_vars([
                ("SERVICE_HOST", "127.0.0.1"),
                ("SERVICE_PORT", "9000"),
                ("HERMES__SERVICE__MODE", "kwargs"),
                ("HERMES__LOGGING__LEVEL", "warn"),
                ("HERMES__LOGGING__FILE_LINE_INFO", "yes"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.http_addr(), "127.0.0.1:9000");
        assert_eq!(config.service.mode, DispatchMode::Kwargs);
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.file_line_info);
    }

    #[test]
    fn test_env_parse_error() {
        let err = ConfigLoader::new()
            .with_env_vars([("SERVICE_PORT", "five thousand")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParse { ref var, .. } if var == "SERVICE_PORT"));

        let err = ConfigLoader::new()
            .with_env_vars([("HERMES__SERVICE__MODE", "decorated")])
            .unwrap_err();
        assert!(err.to_string().contains("decorated"));
    }

    #[test]
    fn test_env_wins_over_file() {
        let config = ConfigLoader::new()
            .with_string("[service]\nport = 7000", "toml")
            .unwrap()
            .with_env_vars([("HERMES__SERVICE__PORT", "7001")])
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.service.port, 7001);
    }

    #[test]
    fn test_dotenv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SERVICE_PORT=6000\nHERMES__LOGGING__FORMAT=pretty").unwrap();

        let config = ConfigLoader::new()
            .with_dotenv_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.service.port, 6000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_validates() {
        let err = ConfigLoader::new()
            .with_string("[service]\nbody_timeout_secs = 0", "toml")
            .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
