//! Tracing subscriber setup

use crate::settings::LogConfig;
use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber; `RUST_LOG` takes precedence over the configured level
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}
