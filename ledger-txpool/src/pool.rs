//! Nonce ordered transaction pool

use crate::TransactionSet;
use ledger_core::{Address, Hash, Transaction};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Maximum number of transactions handed out by a single [`TxnPool::fetch`]
pub const POOL_PAGE: usize = 20;

/// Transaction pool interface.
///
/// Every transaction returned by `fetch` or `fetch_for` moves to the pending
/// set and stays there until the caller passes it to exactly one of `clear`
/// (it was included in a block) or `restore` (inclusion failed).
pub trait TxnPool: Send + Sync {
    /// Collect up to [`POOL_PAGE`] transactions from the active set into the pending set
    fn fetch(&self) -> Vec<Transaction>;

    /// Collect every active transaction of `address` into the pending set
    fn fetch_for(&self, address: &Address) -> Option<TransactionSet>;

    /// Insert transactions into the active set
    fn insert(&self, transactions: &[Transaction]);

    /// Whether a transaction with the given hash is in the active set
    fn contains(&self, hash: &Hash) -> bool;

    /// Remove transactions from the active and pending sets
    fn clear(&self, transactions: &[Transaction]);

    /// Move pending transactions back into the active set
    fn restore(&self, transactions: &[Transaction]);

    /// Remove every transaction, returning how many were removed
    fn purge(&self) -> usize;

    /// Number of fetched but unresolved transactions
    fn pending(&self) -> usize;

    /// Number of transactions available for fetching
    fn active(&self) -> usize;
}

/// Pool size snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub pending: usize,
    pub senders: usize,
}

#[derive(Debug, Default)]
struct PoolInner {
    /// Active transactions grouped by sender and indexed by nonce
    pool: BTreeMap<Address, TransactionSet>,
    /// Flat view of the active transactions by hash
    lookup: HashMap<Hash, Transaction>,
    /// Fetched transactions awaiting clear or restore
    pending: HashMap<Hash, Transaction>,
}

impl PoolInner {
    /// Place `txn` in its sender's set and the lookup, evicting any active
    /// transaction it displaces at the same nonce
    fn activate(&mut self, hash: Hash, txn: Transaction) {
        let set = self.pool.entry(txn.from.clone()).or_default();
        if let Some(displaced) = set.put(txn.clone()) {
            if displaced != txn {
                debug!(nonce = txn.nonce, from = %txn.from, "Replacing pooled transaction");
                self.lookup.remove(&displaced.hash());
            }
        }
        self.lookup.insert(hash, txn);
    }

    /// Remove `txn` from the active set, if it is there
    fn deactivate(&mut self, hash: &Hash, txn: &Transaction) -> bool {
        if self.lookup.remove(hash).is_none() {
            return false;
        }

        if let Some(set) = self.pool.get_mut(&txn.from) {
            if set.get(txn.nonce) == Some(txn) {
                set.remove(txn.nonce);
            }
            if set.is_empty() {
                self.pool.remove(&txn.from);
            }
        }
        true
    }
}

/// Concurrency-safe transaction pool ordered by sender nonce.
///
/// One reader/writer lock guards all of the pool's maps, so no caller ever
/// observes a partially applied operation.
#[derive(Debug, Default)]
pub struct NoncePool {
    inner: RwLock<PoolInner>,
}

impl NoncePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction with the given hash is in the pending set
    pub fn is_pending(&self, hash: &Hash) -> bool {
        self.inner.read().pending.contains_key(hash)
    }

    /// Snapshot of the pool sizes
    pub fn stats(&self) -> PoolStats {
        let inner = self.inner.read();
        PoolStats {
            active: inner.lookup.len(),
            pending: inner.pending.len(),
            senders: inner.pool.len(),
        }
    }
}

impl TxnPool for NoncePool {
    fn fetch(&self) -> Vec<Transaction> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut transactions = Vec::with_capacity(POOL_PAGE);
        let mut drained = Vec::new();

        for (address, set) in inner.pool.iter_mut() {
            while transactions.len() < POOL_PAGE {
                let Some(txn) = set.pop_lowest() else {
                    break;
                };
                let hash = txn.hash();
                inner.lookup.remove(&hash);
                inner.pending.insert(hash, txn.clone());
                transactions.push(txn);
            }

            if set.is_empty() {
                drained.push(address.clone());
            }
            if transactions.len() == POOL_PAGE {
                break;
            }
        }

        for address in drained {
            inner.pool.remove(&address);
        }

        debug!(
            fetched = transactions.len(),
            pending = inner.pending.len(),
            "Fetched transactions from pool"
        );
        transactions
    }

    fn fetch_for(&self, address: &Address) -> Option<TransactionSet> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let set = inner.pool.remove(address)?;
        for txn in set.iter() {
            let hash = txn.hash();
            inner.lookup.remove(&hash);
            inner.pending.insert(hash, txn.clone());
        }

        debug!(fetched = set.len(), from = %address, "Fetched sender transactions from pool");
        Some(set)
    }

    fn insert(&self, transactions: &[Transaction]) {
        let mut inner = self.inner.write();

        for txn in transactions {
            let hash = txn.hash();
            if inner.pending.contains_key(&hash) {
                debug!(hash = %hash, "Ignoring insert of pending transaction");
                continue;
            }
            inner.activate(hash, txn.clone());
        }
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.inner.read().lookup.contains_key(hash)
    }

    fn clear(&self, transactions: &[Transaction]) {
        let mut inner = self.inner.write();

        let mut cleared = 0;
        for txn in transactions {
            let hash = txn.hash();
            let was_active = inner.deactivate(&hash, txn);
            let was_pending = inner.pending.remove(&hash).is_some();
            if was_active || was_pending {
                cleared += 1;
            }
        }

        debug!(cleared, "Cleared transactions from pool");
    }

    fn restore(&self, transactions: &[Transaction]) {
        let mut inner = self.inner.write();

        let mut restored = 0;
        for txn in transactions {
            let hash = txn.hash();
            let Some(pending) = inner.pending.remove(&hash) else {
                continue;
            };

            // A transaction inserted at the same nonce after the fetch takes precedence
            let superseded = inner
                .pool
                .get(&pending.from)
                .and_then(|set| set.get(pending.nonce))
                .is_some_and(|active| *active != pending);
            if superseded {
                warn!(
                    hash = %hash,
                    from = %pending.from,
                    nonce = pending.nonce,
                    "Dropping restored transaction superseded by a newer insert"
                );
                continue;
            }

            inner.activate(hash, pending);
            restored += 1;
        }

        debug!(restored, "Restored transactions into pool");
    }

    fn purge(&self) -> usize {
        let mut inner = self.inner.write();
        let count = inner.lookup.len() + inner.pending.len();
        *inner = PoolInner::default();
        count
    }

    fn pending(&self) -> usize {
        self.inner.read().pending.len()
    }

    fn active(&self) -> usize {
        self.inner.read().lookup.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::Nonce;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    fn txn(from: &str, nonce: Nonce, value: u64) -> Transaction {
        Transaction::new(Address::from(from), Address::from("bob"), nonce, value)
    }

    /// Checks the structural invariants of the pool
    fn assert_consistent(pool: &NoncePool) {
        let inner = pool.inner.read();

        for hash in inner.lookup.keys() {
            assert!(
                !inner.pending.contains_key(hash),
                "{} is both active and pending",
                hash
            );
        }

        let grouped: usize = inner.pool.values().map(TransactionSet::len).sum();
        assert_eq!(grouped, inner.lookup.len());
        for (address, set) in &inner.pool {
            assert!(!set.is_empty());
            for txn in set.iter() {
                assert_eq!(&txn.from, address);
                assert!(inner.lookup.contains_key(&txn.hash()));
            }
        }
    }

    #[test]
    fn test_insert_and_contains() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 10);
        let b = txn("bob", 0, 10);

        pool.insert(&[a.clone(), b.clone()]);
        assert_eq!(pool.active(), 2);
        assert_eq!(pool.pending(), 0);
        assert!(pool.contains(&a.hash()));
        assert!(pool.contains(&b.hash()));
        assert_eq!(pool.stats().senders, 2);
        assert_consistent(&pool);
    }

    #[test]
    fn test_insert_same_nonce_last_wins() {
        let pool = NoncePool::new();
        let first = txn("alice", 3, 10);
        let second = txn("alice", 3, 20);

        pool.insert(&[first.clone()]);
        pool.insert(&[second.clone()]);

        assert_eq!(pool.active(), 1);
        assert!(!pool.contains(&first.hash()));
        assert!(pool.contains(&second.hash()));
        assert_eq!(pool.fetch(), vec![second]);
        assert_consistent(&pool);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 10);
        pool.insert(&[a.clone(), a.clone()]);
        pool.insert(&[a]);
        assert_eq!(pool.active(), 1);
        assert_consistent(&pool);
    }

    #[test]
    fn test_fetch_moves_to_pending() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 10);
        pool.insert(&[a.clone()]);

        assert_eq!(pool.fetch(), vec![a.clone()]);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.pending(), 1);
        assert!(!pool.contains(&a.hash()));
        assert!(pool.is_pending(&a.hash()));
        assert!(pool.fetch().is_empty());
        assert_consistent(&pool);
    }

    #[test]
    fn test_fetch_page_bound() {
        let pool = NoncePool::new();
        let txns: Vec<Transaction> = (0..25).map(|n| txn("alice", n, 1)).collect();
        pool.insert(&txns);

        let first = pool.fetch();
        assert_eq!(first.len(), POOL_PAGE);
        let nonces: Vec<Nonce> = first.iter().map(|t| t.nonce).collect();
        assert_eq!(nonces, (0..20).collect::<Vec<_>>());

        let second = pool.fetch();
        assert_eq!(second.len(), 5);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.pending(), 25);
        assert_consistent(&pool);
    }

    #[test]
    fn test_fetch_spans_senders() {
        let pool = NoncePool::new();
        for sender in ["alice", "bob", "carol"] {
            let txns: Vec<Transaction> = (0..10).map(|n| txn(sender, n, 1)).collect();
            pool.insert(&txns);
        }

        let batch = pool.fetch();
        assert_eq!(batch.len(), POOL_PAGE);
        assert_eq!(pool.active(), 10);

        let mut seen: Vec<Hash> = batch.iter().map(Transaction::hash).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), POOL_PAGE);
        assert_consistent(&pool);
    }

    #[test]
    fn test_fetch_for() {
        let pool = NoncePool::new();
        pool.insert(&[txn("alice", 2, 1), txn("alice", 0, 1), txn("bob", 0, 1)]);

        let set = pool.fetch_for(&Address::from("alice")).unwrap();
        let nonces: Vec<Nonce> = set.iter().map(|t| t.nonce).collect();
        assert_eq!(nonces, vec![0, 2]);
        assert_eq!(pool.active(), 1);
        assert_eq!(pool.pending(), 2);

        assert!(pool.fetch_for(&Address::from("alice")).is_none());
        assert!(pool.fetch_for(&Address::from("nobody")).is_none());
        assert_consistent(&pool);
    }

    #[test]
    fn test_clear() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 1);
        let b = txn("alice", 1, 1);
        pool.insert(&[a.clone(), b.clone()]);

        let fetched = pool.fetch_for(&Address::from("alice")).unwrap().flatten();
        pool.clear(&fetched[..1]);
        assert_eq!(pool.pending(), 1);

        // Clearing an active transaction removes it as well
        pool.restore(&[b.clone()]);
        pool.clear(&[b.clone()]);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.pending(), 0);

        // Clearing absent transactions is a no-op
        pool.clear(&[a, b]);
        assert_eq!(pool.stats(), PoolStats::default());
        assert_consistent(&pool);
    }

    #[test]
    fn test_restore_round_trip() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 1);
        pool.insert(&[a.clone(), txn("bob", 0, 1)]);
        let before = pool.active();

        let fetched = pool.fetch();
        assert!(fetched.contains(&a));
        pool.restore(&fetched);

        assert_eq!(pool.active(), before);
        assert_eq!(pool.pending(), 0);
        assert!(pool.contains(&a.hash()));
        assert_consistent(&pool);
    }

    #[test]
    fn test_restore_only_pending() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 1);

        pool.restore(&[a.clone()]);
        assert_eq!(pool.active(), 0);

        pool.insert(&[a.clone()]);
        pool.restore(&[a.clone()]);
        assert_eq!(pool.active(), 1);
        assert_consistent(&pool);
    }

    #[test]
    fn test_restore_keeps_newer_insert() {
        let pool = NoncePool::new();
        let fetched = txn("alice", 0, 10);
        let newer = txn("alice", 0, 20);

        pool.insert(&[fetched.clone()]);
        assert_eq!(pool.fetch(), vec![fetched.clone()]);
        pool.insert(&[newer.clone()]);
        pool.restore(&[fetched.clone()]);

        assert_eq!(pool.active(), 1);
        assert_eq!(pool.pending(), 0);
        assert!(pool.contains(&newer.hash()));
        assert!(!pool.contains(&fetched.hash()));
        assert_eq!(pool.fetch(), vec![newer]);
        assert_consistent(&pool);
    }

    #[test]
    fn test_insert_ignores_pending() {
        let pool = NoncePool::new();
        let a = txn("alice", 0, 1);
        pool.insert(&[a.clone()]);
        pool.fetch();

        pool.insert(&[a.clone()]);
        assert!(!pool.contains(&a.hash()));
        assert!(pool.is_pending(&a.hash()));
        assert_consistent(&pool);
    }

    #[test]
    fn test_purge() {
        let pool = NoncePool::new();
        let txns: Vec<Transaction> = (0..30).map(|n| txn("alice", n, 1)).collect();
        pool.insert(&txns);
        pool.fetch();

        assert_eq!(pool.purge(), 30);
        assert_eq!(pool.active(), 0);
        assert_eq!(pool.pending(), 0);
        assert_eq!(pool.purge(), 0);
    }

    #[test]
    fn test_concurrent_access() {
        let pool = Arc::new(NoncePool::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let sender = format!("sender-{}", worker);
                    let txns: Vec<Transaction> =
                        (0..50).map(|n| txn(&sender, n, worker)).collect();
                    pool.insert(&txns);
                    let fetched = pool.fetch();
                    pool.restore(&fetched);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(pool.active(), 400);
        assert_eq!(pool.pending(), 0);
        assert_consistent(&pool);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(Vec<(u8, u8, u8)>),
        Fetch,
        FetchFor(u8),
        ClearFetched,
        RestoreFetched,
        Clear(Vec<(u8, u8, u8)>),
        Purge,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let entries = prop::collection::vec((0u8..4, 0u8..8, 0u8..3), 0..12);
        prop_oneof![
            3 => entries.clone().prop_map(Op::Insert),
            2 => Just(Op::Fetch),
            1 => (0u8..4).prop_map(Op::FetchFor),
            2 => Just(Op::ClearFetched),
            2 => Just(Op::RestoreFetched),
            1 => entries.prop_map(Op::Clear),
            1 => Just(Op::Purge),
        ]
    }

    fn build(entries: &[(u8, u8, u8)]) -> Vec<Transaction> {
        entries
            .iter()
            .map(|(sender, nonce, value)| {
                txn(&format!("s{}", sender), *nonce as Nonce, *value as u64)
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_active_and_pending_are_disjoint(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let pool = NoncePool::new();
            let mut fetched: Vec<Transaction> = Vec::new();

            for op in ops {
                match op {
                    Op::Insert(entries) => pool.insert(&build(&entries)),
                    Op::Fetch => fetched.extend(pool.fetch()),
                    Op::FetchFor(sender) => {
                        if let Some(set) = pool.fetch_for(&Address::from(format!("s{}", sender).as_str())) {
                            fetched.extend(set);
                        }
                    }
                    Op::ClearFetched => pool.clear(&std::mem::take(&mut fetched)),
                    Op::RestoreFetched => pool.restore(&std::mem::take(&mut fetched)),
                    Op::Clear(entries) => pool.clear(&build(&entries)),
                    Op::Purge => {
                        pool.purge();
                        fetched.clear();
                    }
                }

                assert_consistent(&pool);
                let stats = pool.stats();
                prop_assert_eq!(stats.active, pool.active());
                prop_assert_eq!(stats.pending, pool.pending());
            }
        }
    }
}
