//! # Hermes Config
//!
//! Typed, layered configuration for Hermes services.
//!
//! ```no_run
//! use hermes_config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("hermes.toml")?
//!     .with_dotenv()?
//!     .with_env()?
//!     .load()?;
//!
//! println!("listening on {} in {} mode", config.http_addr(), config.service.mode);
//! # Ok::<(), hermes_config::ConfigError>(())
//! ```
//!
//! A configuration file looks like:
//!
//! ```toml
//! [service]
//! host = "0.0.0.0"
//! port = 5000
//! mode = "wraps"        # simple | kwargs | wraps
//!
//! [logging]
//! level = "info"
//! format = "json"       # json | pretty
//! ```

#![doc(html_root_url = "https://docs.rs/hermes-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{DispatchMode, LoggingSection, ServiceConfig, ServiceSection};
pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_PREFIX};
