//! Per-sender nonce ordered transaction container

use ledger_core::{Nonce, Transaction};
use std::collections::BTreeMap;

/// Transactions of a single sender, indexed and ordered by nonce.
///
/// At most one transaction is held per nonce; a later insert at an occupied
/// nonce replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSet {
    items: BTreeMap<Nonce, Transaction>,
}

impl TransactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `txn` at its nonce, returning the transaction it replaced
    pub fn put(&mut self, txn: Transaction) -> Option<Transaction> {
        self.items.insert(txn.nonce, txn)
    }

    /// Remove the transaction with the given nonce
    pub fn remove(&mut self, nonce: Nonce) -> Option<Transaction> {
        self.items.remove(&nonce)
    }

    pub fn get(&self, nonce: Nonce) -> Option<&Transaction> {
        self.items.get(&nonce)
    }

    pub fn contains(&self, nonce: Nonce) -> bool {
        self.items.contains_key(&nonce)
    }

    /// Lowest nonce held
    pub fn lowest_nonce(&self) -> Option<Nonce> {
        self.items.keys().next().copied()
    }

    /// Remove and return the transaction with the lowest nonce
    pub fn pop_lowest(&mut self) -> Option<Transaction> {
        self.items.pop_first().map(|(_, txn)| txn)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in ascending nonce order
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.items.values()
    }

    /// Nonce sorted copy of the transactions
    pub fn flatten(&self) -> Vec<Transaction> {
        self.items.values().cloned().collect()
    }
}

impl IntoIterator for TransactionSet {
    type Item = Transaction;
    type IntoIter = std::collections::btree_map::IntoValues<Nonce, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

impl FromIterator<Transaction> for TransactionSet {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut set = Self::new();
        for txn in iter {
            set.put(txn);
        }
        set
    }
}
