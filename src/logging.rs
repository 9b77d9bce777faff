//! Tracing setup, mirroring `zensight-common::init_tracing`: an `EnvFilter`
//! sourced from `RUST_LOG` if set, falling back to the configured level, and
//! a choice of human-readable or JSON output.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Result, TransportError};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global tracing subscriber. Safe to call once per process;
/// a second call returns an error rather than panicking.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .try_init()
            .map_err(|e| TransportError::Config(format!("failed to initialize tracing: {e}")))?,
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .try_init()
            .map_err(|e| TransportError::Config(format!("failed to initialize tracing: {e}")))?,
    }

    Ok(())
}
