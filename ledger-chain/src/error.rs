//! Chain error types

use ledger_core::{CoreError, Hash};
use ledger_db::DbError;
use thiserror::Error;

/// Chain manager error type.
///
/// Variants name the phase that failed so callers can tell a rejected block
/// from a storage fault.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Failed to open chain storage: {0}")]
    Open(#[source] DbError),

    #[error("Failed to build genesis block: {0}")]
    Genesis(#[source] CoreError),

    #[error("Failed to load chain state: {0}")]
    Load(#[source] DbError),

    #[error("Corrupt chain state: {0}")]
    CorruptState(#[source] CoreError),

    /// Summary or proof-of-work failed; chain state is untouched
    #[error("Failed to generate block: {0}")]
    Generate(#[source] CoreError),

    #[error("Failed to serialize block: {0}")]
    Serialize(#[source] CoreError),

    /// The block write failed; chain state is untouched
    #[error("Failed to store block: {0}")]
    Store(#[source] DbError),

    /// The block is durable but the head and height were not persisted
    #[error("Failed to sync chain state: {0}")]
    Sync(#[source] DbError),

    #[error("Block {0} not found")]
    BlockNotFound(Hash),

    #[error("Failed to read block {hash}: {source}")]
    Read { hash: Hash, source: DbError },

    #[error("Failed to decode block {hash}: {source}")]
    Decode { hash: Hash, source: CoreError },

    #[error("Invalid block {hash} at height {height}: {reason}")]
    InvalidBlock {
        hash: Hash,
        height: i64,
        reason: String,
    },

    #[error("Failed to flush chain storage: {0}")]
    Stop(#[source] DbError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;
