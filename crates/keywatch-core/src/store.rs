//! Thread-safe keyed byte store.
//!
//! [`KeyedStore`] is the authoritative mapping from key to value. Reads
//! take a shared lock and never block each other; writes take the
//! exclusive lock only for the duration of the map mutation. Each entry
//! also remembers whether it has ever been overwritten, which the
//! notifier uses to tell a first write apart from an update.
//!
//! The lock is a [`parking_lot::RwLock`], which does not poison, so all
//! operations are total.

use std::collections::HashMap;

use parking_lot::RwLock;

/// A single stored value plus its overwrite flag.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    value: Vec<u8>,
    /// Becomes `true` the first time the key is overwritten. Never reverts.
    updated: bool,
}

/// In-memory key to value mapping guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct KeyedStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl KeyedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`.
    ///
    /// If the key already had an entry it is marked as updated. Returns
    /// `true` when the key was previously present.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> bool {
        let key = key.into();
        let value = value.into();
        let mut entries = self.entries.write();
        match entries.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                entry.updated = true;
                true
            }
            None => {
                entries.insert(
                    key,
                    Entry {
                        value,
                        updated: false,
                    },
                );
                false
            }
        }
    }

    /// Return a copy of the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().get(key).map(|entry| entry.value.clone())
    }

    /// Whether `key` has ever been overwritten.
    ///
    /// False for keys that were never set or were set exactly once.
    pub fn was_updated(&self, key: &str) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.updated)
    }

    /// Whether `key` has been set at least once.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
