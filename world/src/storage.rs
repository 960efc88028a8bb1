//! Key/value persistence boundary the world writes through.

use std::collections::BTreeMap;

use thiserror::Error;

/// Storage key holding the serialized player inventory.
pub const INVENTORY_KEY: &str = "inventory";
/// Storage key holding the serialized player position.
pub const POSITION_KEY: &str = "position";
/// Storage key holding the serialized travelled path.
pub const PATH_KEY: &str = "path";

/// Durable string store keyed by arbitrary strings.
///
/// Cache momentos are stored under their cell key; player state uses the
/// fixed keys exported by this module. Each `save` must be atomic per key.
pub trait Storage {
    /// Stores `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Loads the value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Removes every stored entry.
    fn clear(&mut self) -> Result<(), StorageError>;
}

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The backing medium held content that could not be parsed.
    #[error("storage content is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Volatile storage backed by an ordered map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn save(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}
