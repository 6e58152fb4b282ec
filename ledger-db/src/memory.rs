//! In-memory store

use crate::{DbResult, KeyValueDB};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Volatile key-value database backed by a hash map
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    entries: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueDB for MemoryDatabase {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn flush(&self) -> DbResult<()> {
        Ok(())
    }
}
