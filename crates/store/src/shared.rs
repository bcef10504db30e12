//! One durable map shared by several live contexts.
//!
//! Models browser-tab semantics: every context reads and writes the same
//! underlying map, writes are read-modify-write with last-writer-wins (no
//! locking across contexts, an accepted limitation), and each successful
//! write fans a [`StoreChange`] out to every *other* context's subscription.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, mpsc};

use crate::bus::{StoreChange, Subscription};
use crate::kv::{KvStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    map: RwLock<HashMap<String, String>>,
    subscribers: Mutex<Vec<(u64, mpsc::Sender<StoreChange>)>>,
    next_context: AtomicU64,
}

impl Inner {
    /// Notify every context except the writer. Dead subscribers are dropped
    /// while publishing.
    fn notify_others(&self, writer: u64) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|(ctx, tx)| *ctx == writer || tx.send(StoreChange).is_ok());
        }
    }
}

/// The device-scoped durable store, shared by all live contexts.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Inner>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new context (tab/process) over this store.
    pub fn context(&self) -> ContextStore {
        let id = self.inner.next_context.fetch_add(1, Ordering::Relaxed);
        ContextStore {
            id,
            inner: Arc::clone(&self.inner),
        }
    }
}

/// One context's handle onto the shared store.
#[derive(Debug)]
pub struct ContextStore {
    id: u64,
    inner: Arc<Inner>,
}

impl ContextStore {
    /// Subscribe to changes made by *other* contexts.
    pub fn subscribe(&self) -> Subscription<StoreChange> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subs) = self.inner.subscribers.lock() {
            subs.push((self.id, tx));
        }
        Subscription::new(rx)
    }
}

impl KvStore for ContextStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.map.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        {
            let mut map = self.inner.map.write().map_err(|_| StoreError::Poisoned)?;
            map.insert(key.to_string(), value.to_string());
        }
        self.inner.notify_others(self.id);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        {
            let mut map = self.inner.map.write().map_err(|_| StoreError::Poisoned)?;
            map.remove(key);
        }
        self.inner.notify_others(self.id);
        Ok(())
    }
}
