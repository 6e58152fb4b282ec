//! JSON-RPC front end of the ledger
//!
//! Exposes the chain manager and the transaction pool over HTTP:
//! - `POST /rpc` takes JSON-RPC 2.0 calls (`add_block`, `show_chain`,
//!   `submit_transaction`, `mine_block`, `pool_status`)
//! - `GET /health` reports liveness and the chain height
//! - `GET /metrics` renders the chain metrics for Prometheus

pub mod error;
pub mod methods;
pub mod server;
pub mod types;

pub use error::{RpcError, RpcResult};
pub use server::{build_router, serve, ApiState};
