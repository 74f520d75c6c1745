//! Logging setup
//!
//! Logs go to stderr so stdout stays parseable with `--json`.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `knownuser=info`)
//! - `KNOWNUSER_LOG_FORMAT`: `json` for structured output, anything else for pretty

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "knownuser=info";

pub fn init_logging(verbose: bool) -> Result<()> {
    let log_format =
        std::env::var("KNOWNUSER_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = if verbose {
        EnvFilter::try_new("knownuser=debug")
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
    }
    .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install JSON logger")?;
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install logger")?;
        }
    }

    Ok(())
}
