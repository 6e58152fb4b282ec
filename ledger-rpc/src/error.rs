//! RPC error types

use ledger_chain::ChainError;
use thiserror::Error;

/// Errors reported in the `error` member of a JSON-RPC response
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// JSON-RPC 2.0 error code
    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse(_) => -32700,
            RpcError::InvalidRequest(_) => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
            RpcError::Internal(_) => -32603,
            RpcError::Chain(_) => -32000,
        }
    }
}

impl From<tokio::task::JoinError> for RpcError {
    fn from(err: tokio::task::JoinError) -> Self {
        RpcError::Internal(err.to_string())
    }
}

/// Result type for RPC methods
pub type RpcResult<T> = Result<T, RpcError>;
