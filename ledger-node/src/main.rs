//! Ledger node binary
//!
//! `serve` runs the JSON-RPC server over the chain and transaction pool,
//! `show` prints the chain from head back to genesis.

mod logging;
mod settings;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ledger_chain::ChainManager;
use ledger_rpc::ApiState;
use ledger_txpool::NoncePool;
use parking_lot::Mutex;
use settings::NodeConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ledger-node", author, version, about = "Single-node proof-of-work ledger")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "LEDGER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the block store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `ledger_chain=trace`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the chain and serve JSON-RPC until interrupted
    Serve {
        /// Socket address to listen on
        #[arg(long)]
        listen: Option<String>,
    },
    /// Print every block from head back to genesis
    Show,
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Load the layered configuration and apply command line overrides
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = NodeConfig::load(self.config.as_deref())?;

        if let Some(path) = &self.data_dir {
            config.storage.path = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if let Command::Serve {
            listen: Some(listen),
        } = &self.command
        {
            config.rpc.listen = listen.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.node_config()?;

    match cli.command {
        Command::Serve { .. } => {
            logging::init_tracing(&config.log)?;
            serve(config).await
        }
        Command::Show => {
            logging::init_tracing(&config.log)?;
            show(&config)
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn serve(config: NodeConfig) -> anyhow::Result<()> {
    let chain = ChainManager::open_path(&config.storage).context("failed to start chain")?;
    info!(%chain, "Chain ready");

    let listener = TcpListener::bind(&config.rpc.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.rpc.listen))?;

    let state = ApiState::new(chain, Arc::new(NoncePool::new()));
    let chain = Arc::clone(&state.chain);

    ledger_rpc::serve(listener, state, shutdown_signal()).await?;
    stop_chain(chain)
}

/// Stop the chain manager, or flush it in place while a mining task still holds it
fn stop_chain(chain: Arc<Mutex<ChainManager>>) -> anyhow::Result<()> {
    match Arc::try_unwrap(chain) {
        Ok(chain) => chain.into_inner().stop()?,
        Err(shared) => {
            warn!("Chain manager still in use after shutdown, flushing in place");
            shared.lock().flush()?;
        }
    }
    Ok(())
}

fn show(config: &NodeConfig) -> anyhow::Result<()> {
    let chain = ChainManager::open_path(&config.storage).context("failed to open chain")?;

    let printed = print_chain(&chain);
    chain.stop()?;
    printed
}

fn print_chain(chain: &ChainManager) -> anyhow::Result<()> {
    println!("{}\n", chain);
    for block in chain.iter() {
        let block = block?;
        println!("{}", block);
        println!("Nonce: {}", block.header.nonce);
        for txn in &block.transactions {
            println!("  {}", txn);
        }
        println!();
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use ledger_db::MemoryDatabase;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from([
            "ledger-node",
            "--data-dir",
            "/tmp/ledger",
            "serve",
            "--listen",
            "0.0.0.0:9000",
        ]);

        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/ledger")));
        assert!(matches!(
            cli.command,
            Command::Serve { listen: Some(ref listen) } if listen == "0.0.0.0:9000"
        ));
    }

    #[test]
    fn test_stop_chain_while_shared() {
        let chain = ChainManager::open(Arc::new(MemoryDatabase::new())).unwrap();
        let chain = Arc::new(Mutex::new(chain));
        let held = Arc::clone(&chain);

        stop_chain(chain).unwrap();
        assert_eq!(held.lock().height(), 1);
    }

    #[test]
    fn test_stop_chain_sole_owner() {
        let chain = ChainManager::open(Arc::new(MemoryDatabase::new())).unwrap();
        stop_chain(Arc::new(Mutex::new(chain))).unwrap();
    }
}
