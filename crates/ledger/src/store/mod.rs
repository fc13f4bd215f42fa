//! JSON document store backing ledger and tracker state
//!
//! One document per storage key, written as `<key>.json` under the data
//! directory. Concurrent writers are not coordinated; the last write wins.

use perkpocket_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

enum Backend {
    Disk(PathBuf),
    Memory(RwLock<HashMap<String, String>>),
}

/// Keyed JSON document storage
pub struct Store {
    backend: Backend,
}

impl Store {
    /// Open a store rooted at the given directory, creating it if necessary
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| Error::PersistenceError(e.to_string()))?;
        Ok(Self {
            backend: Backend::Disk(dir.to_path_buf()),
        })
    }

    /// Open an in-memory store (for testing and degraded startup)
    pub fn open_in_memory() -> Self {
        Self {
            backend: Backend::Memory(RwLock::new(HashMap::new())),
        }
    }

    /// Read and decode the document under `key`; `None` when absent
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw = match &self.backend {
            Backend::Disk(dir) => {
                let path = document_path(dir, key);
                if !path.exists() {
                    return Ok(None);
                }
                fs::read_to_string(&path).map_err(|e| Error::PersistenceError(e.to_string()))?
            }
            Backend::Memory(map) => {
                let map = map
                    .read()
                    .map_err(|_| Error::PersistenceError("store lock poisoned".to_string()))?;
                match map.get(key) {
                    Some(raw) => raw.clone(),
                    None => return Ok(None),
                }
            }
        };

        let value =
            serde_json::from_str(&raw).map_err(|e| Error::PersistenceError(e.to_string()))?;
        Ok(Some(value))
    }

    /// Encode and write the document under `key`
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw =
            serde_json::to_string(value).map_err(|e| Error::PersistenceError(e.to_string()))?;

        match &self.backend {
            Backend::Disk(dir) => fs::write(document_path(dir, key), raw)
                .map_err(|e| Error::PersistenceError(e.to_string())),
            Backend::Memory(map) => {
                let mut map = map
                    .write()
                    .map_err(|_| Error::PersistenceError("store lock poisoned".to_string()))?;
                map.insert(key.to_string(), raw);
                Ok(())
            }
        }
    }

    /// Delete the document under `key`; absent keys are not an error
    pub fn remove(&self, key: &str) -> Result<()> {
        match &self.backend {
            Backend::Disk(dir) => {
                let path = document_path(dir, key);
                if path.exists() {
                    fs::remove_file(&path).map_err(|e| Error::PersistenceError(e.to_string()))?;
                }
                Ok(())
            }
            Backend::Memory(map) => {
                let mut map = map
                    .write()
                    .map_err(|_| Error::PersistenceError("store lock poisoned".to_string()))?;
                map.remove(key);
                Ok(())
            }
        }
    }
}

fn document_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", key))
}
