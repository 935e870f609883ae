//! Global `tracing` subscriber setup

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter from `RUST_LOG` when set, otherwise from the configured level
fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_target(true))
            .try_init(),
        _ => registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init(),
    }
    .with_context(|| "Failed to install tracing subscriber")?;

    tracing::debug!("Logging initialized ({} format)", config.format);
    Ok(())
}
