//! Block data structures and operations

use crate::{
    codec, generate_summary, generate_target, hash256, Address, CoreResult, Hash, Target,
    Timestamp, Transaction,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block header, the part of a block covered by its hash
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct BlockHeader {
    /// Hash of the previous block's header
    pub priori: Hash,
    /// Digest of the block's transactions
    pub summary: Hash,
    /// Creation time in seconds
    pub timestamp: Timestamp,
    /// Proof-of-work target
    pub target: Target,
    /// Proof-of-work nonce
    pub nonce: i64,
}

impl BlockHeader {
    /// Create a header stamped with the current time and the network target
    pub fn new(priori: Hash, summary: Hash) -> Self {
        Self {
            priori,
            summary,
            timestamp: chrono::Utc::now().timestamp(),
            target: generate_target(),
            nonce: 0,
        }
    }

    /// Encode the header with the binary codec
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Double SHA-256 of the encoded header
    pub fn hash(&self) -> CoreResult<Hash> {
        Ok(hash256(&self.encode()?))
    }
}

impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Priori: {} || Summary: {} || Timestamp: {} || Nonce: {}",
            self.priori, self.summary, self.timestamp, self.nonce
        )
    }
}

/// Minted block: header, ordered transactions, height and hash
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Block {
    /// Block header
    pub header: BlockHeader,
    /// List of transactions
    pub transactions: Vec<Transaction>,
    /// Height of the block, genesis is 0
    pub height: i64,
    /// Hash of the mined header
    pub block_hash: Hash,
}

impl Block {
    /// Build and mint a block over `transactions` on top of `priori`
    pub fn new(transactions: Vec<Transaction>, priori: Hash, height: i64) -> CoreResult<Self> {
        let summary = generate_summary(&transactions)?;
        let (header, block_hash) = BlockHeader::new(priori, summary).mint()?;

        Ok(Self {
            header,
            transactions,
            height,
            block_hash,
        })
    }

    /// Create the genesis block, rewarding the miner address
    pub fn genesis() -> CoreResult<Self> {
        Self::new(
            vec![Transaction::coinbase(Address::miner())],
            Hash::null(),
            0,
        )
    }

    /// Encode the block with the binary codec
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        codec::encode(self)
    }

    /// Decode a block produced by [`Block::encode`]
    pub fn decode(data: &[u8]) -> CoreResult<Self> {
        codec::decode(data)
    }

    pub fn hash(&self) -> Hash {
        self.block_hash
    }

    pub fn priori(&self) -> Hash {
        self.header.priori
    }

    pub fn txn_count(&self) -> usize {
        self.transactions.len()
    }

    /// Check if block is genesis
    pub fn is_genesis(&self) -> bool {
        self.height == 0 && self.header.priori.is_null()
    }

    /// Verify the block's integrity.
    ///
    /// The stored hash must be the header hash, the summary must match the
    /// transactions and the header must satisfy its proof-of-work target.
    pub fn verify(&self) -> CoreResult<bool> {
        if self.header.hash()? != self.block_hash {
            return Ok(false);
        }

        if generate_summary(&self.transactions)? != self.header.summary {
            return Ok(false);
        }

        self.header.validate()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block Hash: {}", self.block_hash)?;
        writeln!(f, "Block Height: {}", self.height)?;
        writeln!(f, "Prev Block Hash: {}", self.header.priori)?;
        write!(f, "Transactions: {}", self.transactions.len())
    }
}
