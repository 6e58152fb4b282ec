//! Ledger database layer
//!
//! This crate provides the persistent key-value store the chain manager
//! keeps blocks and chain metadata in.

pub mod error;
pub mod kv;
pub mod memory;
pub mod traits;

pub use error::{DbError, DbResult};
pub use kv::{Database, DatabaseConfig};
pub use memory::MemoryDatabase;
pub use traits::{KeyValueDB, SharedDatabase};
