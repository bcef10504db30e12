//! Scheduled-deletion records.
//!
//! Deactivation is a reversible, time-boxed soft delete: the record holds
//! the purge deadline and exists only while the account is pending deletion.
//! There is no timer anywhere; deadlines are evaluated at checkpoints by
//! the account manager.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use daybook_core::Email;
use daybook_store::KvStore;

use crate::records::{self, DEACTIVATION_KEY};

/// Grace window between deactivation and the purge deadline.
pub const DELETION_WINDOW_DAYS: i64 = 30;

/// Per-account purge deadlines, one JSON record in the durable store.
pub struct DeactivationRepository {
    kv: Arc<dyn KvStore>,
}

impl DeactivationRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Schedule the account for deletion; returns the purge deadline.
    pub fn schedule(&self, email: &Email, now: DateTime<Utc>) -> DateTime<Utc> {
        let delete_at = now + Duration::days(DELETION_WINDOW_DAYS);
        let mut map: HashMap<Email, DateTime<Utc>> =
            records::load_map(self.kv.as_ref(), DEACTIVATION_KEY);
        map.insert(email.clone(), delete_at);
        records::store_map(self.kv.as_ref(), DEACTIVATION_KEY, &map);
        delete_at
    }

    /// The pending purge deadline, if any.
    pub fn get(&self, email: &Email) -> Option<DateTime<Utc>> {
        let map: HashMap<Email, DateTime<Utc>> =
            records::load_map(self.kv.as_ref(), DEACTIVATION_KEY);
        map.get(email).copied()
    }

    /// Drop any pending record (reactivation, or purge consuming it).
    pub fn clear(&self, email: &Email) {
        let mut map: HashMap<Email, DateTime<Utc>> =
            records::load_map(self.kv.as_ref(), DEACTIVATION_KEY);
        if map.remove(email).is_some() {
            records::store_map(self.kv.as_ref(), DEACTIVATION_KEY, &map);
        }
    }
}
