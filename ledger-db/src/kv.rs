//! Sled-backed persistent store

use crate::{DbError, DbResult, KeyValueDB};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding the database files
    pub path: PathBuf,
    /// Page cache capacity in bytes
    pub cache_capacity: u64,
    /// Background flush interval in milliseconds, `None` flushes only on demand
    pub flush_every_ms: Option<u64>,
    /// Remove the database files when the handle is dropped
    pub temporary: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data"),
            cache_capacity: 64 * 1024 * 1024, // 64MB
            flush_every_ms: Some(500),
            temporary: false,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for the given directory
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Configuration for a throwaway database
    pub fn temporary() -> Self {
        Self {
            temporary: true,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> DbResult<()> {
        if !self.temporary && self.path.as_os_str().is_empty() {
            return Err(DbError::Config("Database path must not be empty".to_string()));
        }

        if self.cache_capacity == 0 {
            return Err(DbError::Config(
                "Cache capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Persistent key-value database
pub struct Database {
    db: sled::Db,
}

impl Database {
    /// Open the database described by `config`, creating it if needed
    pub fn open(config: &DatabaseConfig) -> DbResult<Self> {
        config.validate()?;

        let mut sled_config = sled::Config::new()
            .cache_capacity(config.cache_capacity)
            .flush_every_ms(config.flush_every_ms)
            .temporary(config.temporary);
        if !config.temporary {
            sled_config = sled_config.path(&config.path);
        }

        let db = sled_config.open()?;
        info!(
            path = %config.path.display(),
            recovered = db.was_recovered(),
            "Database opened"
        );

        Ok(Self { db })
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

impl KeyValueDB for Database {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.db.contains_key(key)?)
    }

    fn flush(&self) -> DbResult<()> {
        let bytes = self.db.flush()?;
        debug!("Flushed {} bytes", bytes);
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.db.flush() {
            warn!("Failed to flush database on close: {}", e);
        }
    }
}
