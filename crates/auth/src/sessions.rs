//! Per-account session sets.
//!
//! Each account maps to the ordered set of session identifiers currently
//! allowed to act as it (one per logged-in tab/device). Every write lands in
//! the shared durable store, so other live contexts receive a change
//! notification and re-validate their own session.

use std::collections::HashMap;
use std::sync::Arc;

use daybook_core::{Email, SessionId};
use daybook_store::KvStore;

use crate::records::{self, SESSIONS_KEY};

/// Per-account session identifier sets, one JSON record in the durable
/// store. Insertion-ordered, duplicate-free.
pub struct SessionRepository {
    kv: Arc<dyn KvStore>,
}

impl SessionRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn load(&self) -> HashMap<Email, Vec<SessionId>> {
        records::load_map(self.kv.as_ref(), SESSIONS_KEY)
    }

    fn store(&self, map: &HashMap<Email, Vec<SessionId>>) {
        records::store_map(self.kv.as_ref(), SESSIONS_KEY, map);
    }

    /// Add `id` to the account's set if absent.
    pub fn register(&self, email: &Email, id: &SessionId) {
        let mut map = self.load();
        let set = map.entry(email.clone()).or_default();
        if !set.contains(id) {
            set.push(*id);
            self.store(&map);
        }
    }

    /// Remove `id` from the account's set.
    pub fn revoke(&self, email: &Email, id: &SessionId) {
        let mut map = self.load();
        if let Some(set) = map.get_mut(email) {
            set.retain(|s| s != id);
            if set.is_empty() {
                map.remove(email);
            }
            self.store(&map);
        }
    }

    /// Replace the account's set wholesale (password change passes only the
    /// acting session's id, dropping every other device).
    pub fn replace_all(&self, email: &Email, ids: Vec<SessionId>) {
        let mut deduped: Vec<SessionId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        let mut map = self.load();
        map.insert(email.clone(), deduped);
        self.store(&map);
    }

    /// Drop the account's whole set (purge path).
    pub fn clear(&self, email: &Email) {
        let mut map = self.load();
        if map.remove(email).is_some() {
            self.store(&map);
        }
    }

    /// Whether `id` may act as the account.
    ///
    /// An account with no registered set is unrestricted; membership is
    /// required only once any id has been registered. Deliberately
    /// preserved compatibility rule (see DESIGN.md).
    pub fn is_allowed(&self, email: &Email, id: &SessionId) -> bool {
        match self.load().get(email) {
            None => true,
            Some(set) if set.is_empty() => true,
            Some(set) => set.contains(id),
        }
    }

    /// Reverse lookup: which account does `id` belong to? Used to resume a
    /// remembered session in a fresh context.
    pub fn find_account(&self, id: &SessionId) -> Option<Email> {
        self.load()
            .into_iter()
            .find(|(_, set)| set.contains(id))
            .map(|(email, _)| email)
    }
}
