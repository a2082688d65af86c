//! Durable key-value storage collaborator.
//!
//! [`RateCache`](crate::RateCache) persists and restores its tiers through
//! [`KeyValueStore`] without knowing what backs it: a file, a database, or
//! plain memory.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::warn;

use crate::errors::RateError;

/// An async key-value store holding string values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Values for the keys that exist. Missing keys are absent from the map.
    async fn get(&self, keys: &[String]) -> Result<HashMap<String, String>, RateError>;

    /// Insert or overwrite every entry.
    async fn set(&self, entries: HashMap<String, String>) -> Result<(), RateError>;

    /// Remove the keys. Missing keys are ignored.
    async fn remove(&self, keys: &[String]) -> Result<(), RateError>;
}

/// In-process store, for tests and for callers that do not need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Memory store mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[String]) -> Result<HashMap<String, String>, RateError> {
        let entries = self.lock_entries();
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: HashMap<String, String>) -> Result<(), RateError> {
        self.lock_entries().extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), RateError> {
        let mut entries = self.lock_entries();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
