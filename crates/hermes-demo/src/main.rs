//! Runs the persons service.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hermes_config::{ConfigLoader, DispatchMode};
use hermes_telemetry::init_logging;

/// Persons service
#[derive(Parser)]
#[command(name = "hermes-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON); skipped if missing
    #[arg(short, long, env = "HERMES_CONFIG", default_value = "hermes.toml")]
    config: PathBuf,

    /// Dispatch mode, overriding the configuration
    #[arg(short, long)]
    mode: Option<DispatchMode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::new()
        .with_defaults()
        .with_optional_file(&cli.config)?
        .with_dotenv()?
        .with_env()?
        .load()
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(mode) = cli.mode {
        config.service.mode = mode;
    }

    init_logging(&config.to_log_config()).context("initializing logging")?;

    let server = hermes_demo::build_server(&config);
    tracing::info!(addr = %config.http_addr(), mode = %config.service.mode, "starting");
    server.run().await.context("running server")?;
    Ok(())
}
