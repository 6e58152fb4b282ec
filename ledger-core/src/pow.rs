//! Proof-of-work mint and validation routines

use crate::{BlockHeader, CoreError, CoreResult, Hash};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, trace};

/// Number of leading zero bits a block hash needs.
///
/// Static and deliberately low so blocks mine quickly on a single machine.
pub const DIFFICULTY: u32 = 18;

/// Attempts between two mining progress reports
const PROGRESS_INTERVAL: i64 = 1 << 16;

/// Upper bound (exclusive) a header hash must fall under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target(U256);

impl Target {
    /// Largest representable target, met by every hash except all ones
    pub const MAX: Target = Target(U256::MAX);

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Zero target, never met by any hash
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// `1 << (256 - bits)`; zero bits saturate to [`Target::MAX`]
    pub fn from_difficulty(bits: u32) -> Self {
        match bits {
            0 => Self::MAX,
            1..=256 => Self(U256::one() << (256 - bits) as usize),
            _ => Self(U256::one()),
        }
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// Whether `hash`, read as an unsigned big-endian integer, is below the target
    pub fn is_met_by(&self, hash: &Hash) -> bool {
        U256::from_big_endian(hash.as_bytes()) < self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        self.0.to_big_endian(&mut bytes);
        bytes
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_big_endian(&bytes))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl bincode::Encode for Target {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        bincode::Encode::encode(&self.to_be_bytes(), encoder)
    }
}

impl<Context> bincode::Decode<Context> for Target {
    fn decode<D: bincode::de::Decoder<Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let bytes = <[u8; 32] as bincode::Decode<Context>>::decode(decoder)?;
        Ok(Self::from_be_bytes(bytes))
    }
}

bincode::impl_borrow_decode!(Target);

/// Target for the network-wide [`DIFFICULTY`]
pub fn generate_target() -> Target {
    Target::from_difficulty(DIFFICULTY)
}

impl BlockHeader {
    /// Proof-of-work search over the whole non-negative nonce space.
    ///
    /// Returns the header with the winning nonce and its hash.
    pub fn mint(self) -> CoreResult<(BlockHeader, Hash)> {
        self.mint_within(i64::MAX)
    }

    /// Proof-of-work search over nonces in `[0, limit)`.
    ///
    /// Finds the smallest nonce whose header hash is below the target.
    pub fn mint_within(mut self, limit: i64) -> CoreResult<(BlockHeader, Hash)> {
        let started = Instant::now();
        self.nonce = 0;

        while self.nonce < limit {
            let hash = self.hash()?;
            if self.target.is_met_by(&hash) {
                let elapsed = started.elapsed().as_secs_f64();
                let attempts = self.nonce + 1;
                debug!(
                    nonce = self.nonce,
                    hash = %hash,
                    hash_rate = attempts as f64 / elapsed.max(f64::EPSILON),
                    "Block mined in {:.3}s",
                    elapsed
                );
                return Ok((self, hash));
            }

            if self.nonce > 0 && self.nonce % PROGRESS_INTERVAL == 0 {
                trace!(nonce = self.nonce, hash = %hash, "Mining block");
            }
            self.nonce += 1;
        }

        Err(CoreError::NonceSpaceExhausted {
            attempts: limit.max(0),
        })
    }

    /// Whether the hash of the header, with its stored nonce, is below its target
    pub fn validate(&self) -> CoreResult<bool> {
        Ok(self.target.is_met_by(&self.hash()?))
    }
}
