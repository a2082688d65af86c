use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fxlens_rates::{KeyValueStore, RateError};

const CURRENT_VERSION: u32 = 1;

/// Key-value store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    version: u32,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn with_store<F>(&self, op: F) -> Result<(), RateError>
    where
        F: FnOnce(&mut HashMap<String, String>),
    {
        let _guard = self.guard();
        let mut entries = self.load_locked()?;
        op(&mut entries);
        self.persist_locked(entries)
    }

    fn read_store(&self) -> Result<HashMap<String, String>, RateError> {
        let _guard = self.guard();
        self.load_locked()
    }

    fn load_locked(&self) -> Result<HashMap<String, String>, RateError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let raw = fs::read(&self.path).map_err(storage_error)?;
        if raw.is_empty() {
            return Ok(HashMap::new());
        }

        let file: StoreFile = serde_json::from_slice(&raw).map_err(|e| {
            RateError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })?;
        Ok(file.entries)
    }

    fn persist_locked(&self, entries: HashMap<String, String>) -> Result<(), RateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(storage_error)?;
        }

        let file = StoreFile {
            version: CURRENT_VERSION,
            entries,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| RateError::Storage(e.to_string()))?;
        fs::write(&self.path, json).map_err(storage_error)
    }
}

fn storage_error(e: std::io::Error) -> RateError {
    RateError::Storage(e.to_string())
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[String]) -> Result<HashMap<String, String>, RateError> {
        let mut entries = self.read_store()?;
        Ok(keys
            .iter()
            .filter_map(|k| entries.remove_entry(k))
            .collect())
    }

    async fn set(&self, values: HashMap<String, String>) -> Result<(), RateError> {
        self.with_store(|entries| entries.extend(values))
    }

    async fn remove(&self, keys: &[String]) -> Result<(), RateError> {
        self.with_store(|entries| {
            for key in keys {
                entries.remove(key);
            }
        })
    }
}
