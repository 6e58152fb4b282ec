//! Ledger chain management
//!
//! This crate owns the chain state on top of the storage layer:
//! - `ChainManager` appends minted blocks and persists the head and height
//! - `ChainIterator` walks the persisted chain from head back to genesis
//! - `ChainMetrics` exposes append and mining statistics to Prometheus

pub mod error;
pub mod iterator;
pub mod manager;
pub mod metrics;

pub use error::{ChainError, ChainResult};
pub use iterator::ChainIterator;
pub use manager::{ChainManager, CHAIN_HEAD_KEY, CHAIN_HEIGHT_KEY};
pub use metrics::ChainMetrics;
