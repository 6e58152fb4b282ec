//! Transaction data structures and operations

use crate::{codec, hash256, Address, CoreError, CoreResult, Hash, Nonce};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest unit multiple of the native token
pub const COIN: u64 = 1_000_000_000;

/// Fixed reward minted by a coinbase transaction
pub const BLOCK_REWARD: u64 = 5 * COIN;

/// Value transfer between two addresses
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Transaction {
    /// Amount transferred, in base units
    pub value: u64,
    /// Sender supplied sequence number
    pub nonce: Nonce,
    /// Sender address
    pub from: Address,
    /// Recipient address
    pub to: Address,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(from: Address, to: Address, nonce: Nonce, value: u64) -> Self {
        Self {
            value,
            nonce,
            from,
            to,
        }
    }

    /// Create the reward-minting transaction for `beneficiary`
    pub fn coinbase(beneficiary: Address) -> Self {
        Self::new(beneficiary, Address::null(), 0, BLOCK_REWARD)
    }

    /// Whether this transaction mints the block reward
    pub fn is_coinbase(&self) -> bool {
        self.to.is_null() && self.nonce == 0 && self.value == BLOCK_REWARD
    }

    /// Encode the transaction with the binary codec
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Double SHA-256 of the encoded transaction.
    ///
    /// Encoding a transaction cannot fail: every field is an integer or a
    /// string, which bincode always encodes. The null hash fallback is never
    /// produced, so pool and summary keys are always distinct content hashes.
    pub fn hash(&self) -> Hash {
        match self.encode() {
            Ok(data) => hash256(&data),
            Err(e) => {
                tracing::warn!("Transaction encoding failed: {}", e);
                Hash::null()
            }
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [value: {}, nonce: {}]",
            self.from, self.to, self.value, self.nonce
        )
    }
}

/// Digest over an ordered list of transactions.
///
/// Concatenates each transaction hash in the given order and double hashes the
/// result. Detects tampering with the list or its order; offers no inclusion
/// proofs.
pub fn generate_summary(transactions: &[Transaction]) -> CoreResult<Hash> {
    if transactions.is_empty() {
        return Err(CoreError::EmptyTransactions);
    }

    let mut buffer = Vec::with_capacity(transactions.len() * 32);
    for (index, tx) in transactions.iter().enumerate() {
        let hash = tx.hash();
        if hash.is_null() {
            return Err(CoreError::NullTransactionHash { index });
        }
        buffer.extend_from_slice(hash.as_bytes());
    }

    Ok(hash256(&buffer))
}
