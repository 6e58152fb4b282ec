//! Core ledger data structures
//!
//! This crate provides the fundamental building blocks of the ledger:
//! - Basic types (Hash, Address) and the double SHA-256 hash function
//! - The `0x` hex codec and the binary codec used for persistence
//! - Transaction and Block structures
//! - The proof-of-work mint and validation routines

pub mod block;
pub mod codec;
pub mod error;
pub mod hexutil;
pub mod pow;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use block::*;
pub use error::*;
pub use pow::{generate_target, Target, DIFFICULTY};
pub use transaction::*;
pub use types::*;
