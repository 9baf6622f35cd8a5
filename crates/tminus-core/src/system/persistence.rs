use crate::error::CoreError;

/// Persistence platform trait: key-value string storage.
///
/// Backends store raw strings and report their own failures (quota, I/O).
/// Encoding is the job of [`crate::storage::Storage`], which also decides
/// how failures surface to callers.
///
/// Implementations: in-memory map, JSON file, browser localStorage.
pub trait Persistence {
    /// Write a string value under key.
    fn save(&mut self, key: &str, data: &str) -> Result<(), CoreError>;

    /// Read a string value by key. `Ok(None)` if not found.
    fn load(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Remove a key. Removing a missing key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), CoreError>;

    /// Remove every key.
    fn clear(&mut self) -> Result<(), CoreError>;
}
