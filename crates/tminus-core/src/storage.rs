//! JSON storage over a [`Persistence`] backend.
//!
//! Page state (dismissed banners, last-seen schedule tab) is best-effort:
//! a broken or full store must never take the page down. [`Storage`]
//! therefore swallows backend and decoding failures, logs them, and reports
//! through its return values instead.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;
use crate::system::Persistence;

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    entries: BTreeMap<String, String>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Persistence for MemoryPersistence {
    fn save(&mut self, key: &str, data: &str) -> Result<(), CoreError> {
        self.entries.insert(key.to_string(), data.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        self.entries.clear();
        Ok(())
    }
}

/// Single JSON-object file backend. The whole file is rewritten on every
/// change; a missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, CoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl Persistence for FilePersistence {
    fn save(&mut self, key: &str, data: &str) -> Result<(), CoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), data.to_string());
        self.write_all(&entries)
    }

    fn load(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CoreError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Typed, failure-tolerant view over a [`Persistence`] backend.
pub struct Storage<P> {
    backend: P,
}

impl<P: Persistence> Storage<P> {
    pub fn new(backend: P) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &P {
        &self.backend
    }

    /// Decode the value under `key`, or `default` if it is missing,
    /// unreadable or not valid JSON for `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.backend.load(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed");
                return default;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored value is not valid JSON");
                default
            }
        }
    }

    /// Returns whether the value was stored.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(CoreError::from)
            .and_then(|raw| self.backend.save(key, &raw));
        self.report(key, "write", result)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let result = self.backend.remove(key);
        self.report(key, "remove", result)
    }

    pub fn clear(&mut self) -> bool {
        let result = self.backend.clear();
        self.report("*", "clear", result)
    }

    fn report(&self, key: &str, op: &str, result: Result<(), CoreError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, op, error = %e, "storage operation failed");
                false
            }
        }
    }
}
