//! Error types for the core crate

use thiserror::Error;

/// Core ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Hex decode error: {0}")]
    Hex(#[from] HexError),

    /// A block cannot be summarised without transactions
    #[error("Empty transaction list")]
    EmptyTransactions,

    /// The transaction at the given position hashed to the null hash
    #[error("Transaction {index} hashed to the null hash")]
    NullTransactionHash { index: usize },

    /// No nonce below the search limit satisfies the target
    #[error("Nonce space exhausted after {attempts} attempts")]
    NonceSpaceExhausted { attempts: i64 },
}

/// Errors produced when decoding `0x` prefixed hex strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HexError {
    #[error("empty hex string")]
    Empty,

    #[error("hex string without 0x prefix")]
    MissingPrefix,

    #[error("hex string of odd length")]
    OddLength,

    #[error("invalid hex string")]
    InvalidCharacter,
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
