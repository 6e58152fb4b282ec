//! Node configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML
//! file, then `LEDGER__SECTION__KEY` environment variables. Command line
//! flags are applied on top by the caller.

use anyhow::{bail, Context};
use config::{Config, Environment, File, FileFormat};
use ledger_db::DatabaseConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "LEDGER";

/// Complete node configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Block store settings
    pub storage: DatabaseConfig,
    pub rpc: RpcConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Socket address the JSON-RPC server binds to
    pub listen: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl NodeConfig {
    /// Load the configuration from the defaults, `path` and the process environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&NodeConfig::default())
            .context("failed to encode default configuration")?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config: NodeConfig = builder
            .add_source(env)
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.storage
            .validate()
            .context("invalid storage configuration")?;

        if self.rpc.listen.parse::<SocketAddr>().is_err() {
            bail!("invalid RPC listen address: {}", self.rpc.listen);
        }

        if self.log.level.trim().is_empty() {
            bail!("log level must not be empty");
        }

        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
