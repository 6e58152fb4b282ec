//! Transaction pool
//!
//! Holds transactions between submission and block inclusion. Transactions
//! are grouped per sender and ordered by nonce; a batch handed out for
//! inclusion stays pending until it is either cleared (included) or restored
//! (inclusion failed).

pub mod pool;
pub mod txnset;

pub use pool::{NoncePool, PoolStats, TxnPool, POOL_PAGE};
pub use txnset::TransactionSet;
