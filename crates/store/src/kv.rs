//! Key-value store abstraction and in-memory backing.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

/// Storage error.
///
/// Writes are best-effort: callers are expected to log a rejected write and
/// carry on with their in-memory effect. Loss of durability is the worst
/// case, not loss of the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store rejected a write (capacity, permissions).
    #[error("storage write rejected: {0}")]
    WriteRejected(String),

    /// Internal lock poisoning.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Flat string map scoped to the client device.
///
/// Durable implementations survive restarts; ephemeral ones last for the
/// current context only. Absence is represented, never thrown.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store.
///
/// Serves as the per-context ephemeral store and as the unit-test backing
/// for durable storage.
#[derive(Debug, Default)]
pub struct MemoryKv {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.map.write().map_err(|_| StoreError::Poisoned)?;
        map.remove(key);
        Ok(())
    }
}
