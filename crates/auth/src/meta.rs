//! Per-account metadata.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use daybook_core::Email;
use daybook_store::KvStore;

use crate::records::{self, META_KEY};

/// Per-account creation timestamps. Created lazily on first successful
/// login/registration, never overwritten afterwards.
pub struct AccountMetaRepository {
    kv: Arc<dyn KvStore>,
}

impl AccountMetaRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Return the account's creation instant, stamping `now` if none exists.
    pub fn ensure(&self, email: &Email, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut map: HashMap<Email, DateTime<Utc>> = records::load_map(self.kv.as_ref(), META_KEY);
        if let Some(created_at) = map.get(email) {
            return *created_at;
        }
        map.insert(email.clone(), now);
        records::store_map(self.kv.as_ref(), META_KEY, &map);
        now
    }

    pub fn remove(&self, email: &Email) {
        let mut map: HashMap<Email, DateTime<Utc>> = records::load_map(self.kv.as_ref(), META_KEY);
        if map.remove(email).is_some() {
            records::store_map(self.kv.as_ref(), META_KEY, &map);
        }
    }
}
