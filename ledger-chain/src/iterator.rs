//! Backward cursor over the persisted chain

use crate::{ChainError, ChainResult};
use ledger_core::{Block, Hash};
use ledger_db::{KeyValueDB, SharedDatabase};

/// Read and decode the block stored under `hash`
pub(crate) fn read_block(db: &dyn KeyValueDB, hash: &Hash) -> ChainResult<Block> {
    let data = db
        .get(hash.as_bytes())
        .map_err(|source| ChainError::Read {
            hash: *hash,
            source,
        })?
        .ok_or(ChainError::BlockNotFound(*hash))?;

    Block::decode(&data).map_err(|source| ChainError::Decode {
        hash: *hash,
        source,
    })
}

/// Read-only cursor walking from a starting hash back to genesis.
///
/// Holds no lock: appending blocks while an iterator is live leaves it on
/// the head it started from. After the first error the iterator is done.
pub struct ChainIterator {
    db: SharedDatabase,
    cursor: Hash,
}

impl ChainIterator {
    pub fn new(db: SharedDatabase, head: Hash) -> Self {
        Self { db, cursor: head }
    }

    /// Hash of the next block to be returned
    pub fn cursor(&self) -> Hash {
        self.cursor
    }

    /// Whether the cursor has moved past genesis
    pub fn done(&self) -> bool {
        self.cursor.is_null()
    }
}

impl Iterator for ChainIterator {
    type Item = ChainResult<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done() {
            return None;
        }

        match read_block(self.db.as_ref(), &self.cursor) {
            Ok(block) => {
                self.cursor = block.priori();
                Some(Ok(block))
            }
            Err(e) => {
                self.cursor = Hash::null();
                Some(Err(e))
            }
        }
    }
}
