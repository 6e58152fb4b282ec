//! Database traits and interfaces

use crate::{DbError, DbResult};
use std::sync::Arc;

/// Key-value database trait
pub trait KeyValueDB: Send + Sync {
    /// Get value by key
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Put key-value pair
    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()>;

    /// Check if key exists
    fn exists(&self, key: &[u8]) -> DbResult<bool>;

    /// Flush pending writes to durable storage
    fn flush(&self) -> DbResult<()>;

    /// Get value by key, treating absence as an error
    fn fetch(&self, key: &[u8]) -> DbResult<Vec<u8>> {
        self.get(key)?
            .ok_or_else(|| DbError::KeyNotFound(display_key(key)))
    }
}

/// Shared database reference
pub type SharedDatabase = Arc<dyn KeyValueDB>;

/// Render a key for error messages: text keys verbatim, binary keys as hex
pub(crate) fn display_key(key: &[u8]) -> String {
    match std::str::from_utf8(key) {
        Ok(text) if text.chars().all(|c| c.is_ascii_graphic()) => text.to_string(),
        _ => hex::encode(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_key() {
        assert_eq!(display_key(b"state-chainhead"), "state-chainhead");
        assert_eq!(display_key(&[0x00, 0xab]), "00ab");
        assert_eq!(display_key(b"two words"), "74776f20776f726473");
    }
}
