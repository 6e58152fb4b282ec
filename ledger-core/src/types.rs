//! Basic ledger types

use crate::{hexutil, CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Timestamp in seconds since Unix epoch
pub type Timestamp = i64;

/// Per-sender transaction sequence number
pub type Nonce = u64;

/// 32-byte hash type
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Create a new hash from byte array
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create hash from a slice of exactly 32 bytes
    pub fn from_slice(slice: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| {
            CoreError::InvalidHash(format!("expected 32 bytes, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Get the underlying byte array
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to a `0x` prefixed hex string
    pub fn to_hex(&self) -> String {
        hexutil::encode(self.0)
    }

    /// Create from a `0x` prefixed hex string
    pub fn from_hex(hex: &str) -> CoreResult<Self> {
        let bytes = hexutil::decode(hex)?;
        Self::from_slice(&bytes)
    }

    /// Null hash (all bytes are 0), marks "no predecessor" or "no value"
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Whether this is the null hash
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Double SHA-256 of `data`
pub fn hash256(data: &[u8]) -> Hash {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    Hash(second.into())
}

/// Fixed beneficiary of block rewards
pub const MINER_ADDRESS: &str = "miner";

/// Opaque account identifier
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Address(String);

impl Address {
    /// Create a new address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Null address, the recipient of reward-minting transactions
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Address credited by coinbase transactions
    pub fn miner() -> Self {
        Self(MINER_ADDRESS.to_string())
    }

    /// Whether this is the null address
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Self(address)
    }
}
