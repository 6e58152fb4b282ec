//! Chain manager: appends blocks and persists the chain state

use crate::{iterator::read_block, ChainError, ChainIterator, ChainMetrics, ChainResult};
use ledger_core::{codec, Block, Hash, Transaction};
use ledger_db::{Database, DatabaseConfig, SharedDatabase};
use ledger_txpool::TxnPool;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Storage key of the chain head hash
pub const CHAIN_HEAD_KEY: &[u8] = b"state-chainhead";

/// Storage key of the encoded chain height
pub const CHAIN_HEIGHT_KEY: &[u8] = b"state-chainheight";

/// Owner of the chain head and height.
///
/// Not internally synchronized: callers must serialize mutating calls, for
/// example by holding the manager behind a single mutex.
pub struct ChainManager {
    db: SharedDatabase,
    /// Hash of the most recently appended block
    head: Hash,
    /// Number of blocks in the chain, which is also the next block's height
    height: i64,
    metrics: ChainMetrics,
}

impl ChainManager {
    /// Load the chain from `db`, or initialize it with a genesis block on first use
    pub fn open(db: SharedDatabase) -> ChainResult<Self> {
        Self::open_with_metrics(db, ChainMetrics::new()?)
    }

    /// Open the sled store described by `config` and load or initialize the chain
    pub fn open_path(config: &DatabaseConfig) -> ChainResult<Self> {
        let db = Database::open(config).map_err(ChainError::Open)?;
        Self::open(Arc::new(db))
    }

    pub fn open_with_metrics(db: SharedDatabase, metrics: ChainMetrics) -> ChainResult<Self> {
        let initialized = db.exists(CHAIN_HEAD_KEY).map_err(ChainError::Load)?;

        let mut manager = Self {
            db,
            head: Hash::null(),
            height: 0,
            metrics,
        };

        if initialized {
            manager.load()?;
        } else {
            manager.init()?;
        }

        manager.metrics.chain_height.set(manager.height);
        Ok(manager)
    }

    fn load(&mut self) -> ChainResult<()> {
        let head = self.db.fetch(CHAIN_HEAD_KEY).map_err(ChainError::Load)?;
        let height = self.db.fetch(CHAIN_HEIGHT_KEY).map_err(ChainError::Load)?;

        self.head = Hash::from_slice(&head).map_err(ChainError::CorruptState)?;
        self.height = codec::decode(&height).map_err(ChainError::CorruptState)?;

        info!(head = %self.head, height = self.height, "Loaded chain");
        Ok(())
    }

    fn init(&mut self) -> ChainResult<()> {
        let genesis = Block::genesis().map_err(ChainError::Genesis)?;
        let encoded = genesis.encode().map_err(ChainError::Genesis)?;
        self.db
            .put(genesis.hash().as_bytes(), &encoded)
            .map_err(ChainError::Store)?;

        self.head = genesis.hash();
        self.height = 1;
        self.sync()?;

        info!(genesis = %self.head, "Initialized chain");
        Ok(())
    }

    /// Mirror the in-memory head and height to storage
    fn sync(&self) -> ChainResult<()> {
        let height = codec::encode(&self.height).map_err(ChainError::Serialize)?;

        self.db
            .put(CHAIN_HEAD_KEY, self.head.as_bytes())
            .map_err(ChainError::Sync)?;
        self.db
            .put(CHAIN_HEIGHT_KEY, &height)
            .map_err(ChainError::Sync)?;
        Ok(())
    }

    pub fn head(&self) -> Hash {
        self.head
    }

    pub fn height(&self) -> i64 {
        self.height
    }

    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    /// Mint a block over `transactions` on top of the head and append it.
    ///
    /// The head and height advance only once the block is stored. A
    /// [`ChainError::Sync`] means the block was stored and the in-memory state
    /// advanced, but the persisted head still names its predecessor.
    pub fn add_block(&mut self, transactions: Vec<Transaction>) -> ChainResult<Block> {
        let started = Instant::now();
        let block =
            Block::new(transactions, self.head, self.height).map_err(ChainError::Generate)?;
        self.metrics
            .mining_seconds
            .observe(started.elapsed().as_secs_f64());

        let encoded = block.encode().map_err(ChainError::Serialize)?;
        self.db
            .put(block.hash().as_bytes(), &encoded)
            .map_err(ChainError::Store)?;

        self.head = block.hash();
        self.height += 1;
        self.metrics.chain_height.set(self.height);
        self.sync()?;

        self.metrics.blocks_appended.inc();
        info!(
            height = block.height,
            hash = %block.hash(),
            txns = block.txn_count(),
            "Appended block"
        );
        Ok(block)
    }

    /// Append a block built from the next page of `pool`.
    ///
    /// Fetched transactions are cleared from the pool once their block is
    /// durable and restored otherwise. Returns `None` when nothing is pending.
    pub fn mine_pending(&mut self, pool: &dyn TxnPool) -> ChainResult<Option<Block>> {
        let transactions = pool.fetch();
        if transactions.is_empty() {
            debug!("No transactions to mine");
            return Ok(None);
        }

        match self.add_block(transactions.clone()) {
            Ok(block) => {
                pool.clear(&transactions);
                Ok(Some(block))
            }
            Err(e @ ChainError::Sync(_)) => {
                pool.clear(&transactions);
                Err(e)
            }
            Err(e) => {
                warn!(txns = transactions.len(), "Block append failed, restoring pool: {}", e);
                pool.restore(&transactions);
                self.metrics
                    .restored_transactions
                    .inc_by(transactions.len() as u64);
                Err(e)
            }
        }
    }

    /// Cursor from the current head back to genesis
    pub fn iter(&self) -> ChainIterator {
        ChainIterator::new(Arc::clone(&self.db), self.head)
    }

    /// Read a single persisted block
    pub fn block(&self, hash: &Hash) -> ChainResult<Block> {
        read_block(self.db.as_ref(), hash)
    }

    /// Walk the whole chain checking each block's proof, hash and links.
    ///
    /// Returns the number of blocks verified.
    pub fn verify_chain(&self) -> ChainResult<usize> {
        let mut expected_hash = self.head;
        let mut expected_height = self.height - 1;
        let mut verified = 0;

        for block in self.iter() {
            let block = block?;
            let invalid = |reason: &str| ChainError::InvalidBlock {
                hash: block.hash(),
                height: block.height,
                reason: reason.to_string(),
            };

            if block.hash() != expected_hash {
                return Err(invalid("stored under a different hash"));
            }
            if block.height != expected_height {
                return Err(invalid("unexpected height"));
            }
            match block.verify() {
                Ok(true) => {}
                Ok(false) => return Err(invalid("failed verification")),
                Err(e) => return Err(invalid(&e.to_string())),
            }

            expected_hash = block.priori();
            expected_height -= 1;
            verified += 1;
        }

        if expected_height != -1 {
            return Err(ChainError::InvalidBlock {
                hash: expected_hash,
                height: expected_height,
                reason: "chain ends before genesis".to_string(),
            });
        }

        debug!(blocks = verified, "Verified chain");
        Ok(verified)
    }

    /// Flush pending storage writes without releasing the handle
    pub fn flush(&self) -> ChainResult<()> {
        self.db.flush().map_err(ChainError::Stop)
    }

    /// Flush and release the storage handle
    pub fn stop(self) -> ChainResult<()> {
        self.flush()?;
        info!(head = %self.head, height = self.height, "Chain manager stopped");
        Ok(())
    }
}

impl fmt::Display for ChainManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Chain Head: {} || Chain Height: {}",
            self.head, self.height
        )
    }
}
