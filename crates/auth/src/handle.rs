//! The current context's own session identifier.

use std::sync::Arc;

use daybook_core::SessionId;
use daybook_store::KvStore;

use crate::records::SESSION_HANDLE_KEY;

/// Holds the session id this execution context believes is valid.
///
/// The id always lives in the context-local ephemeral store; "remember me"
/// additionally mirrors it into the durable store so a fresh context (new
/// tab, restart) can pick it up.
pub struct ActiveSessionHandle {
    ephemeral: Arc<dyn KvStore>,
    durable: Arc<dyn KvStore>,
}

impl ActiveSessionHandle {
    pub fn new(ephemeral: Arc<dyn KvStore>, durable: Arc<dyn KvStore>) -> Self {
        Self { ephemeral, durable }
    }

    /// Persist the id; a non-durable login clears any stale durable mirror.
    pub fn persist(&self, id: &SessionId, durable: bool) {
        let value = id.to_string();
        if let Err(err) = self.ephemeral.set(SESSION_HANDLE_KEY, &value) {
            tracing::warn!(%err, "ephemeral session write failed");
        }
        let result = if durable {
            self.durable.set(SESSION_HANDLE_KEY, &value)
        } else {
            self.durable.remove(SESSION_HANDLE_KEY)
        };
        if let Err(err) = result {
            tracing::warn!(%err, "durable session write failed");
        }
    }

    /// The ephemeral copy wins; the durable mirror is the fallback for a
    /// context that has not logged in itself.
    pub fn read(&self) -> Option<SessionId> {
        self.ephemeral
            .get(SESSION_HANDLE_KEY)
            .or_else(|| self.durable.get(SESSION_HANDLE_KEY))
            .and_then(|raw| raw.parse().ok())
    }

    pub fn clear(&self) {
        if let Err(err) = self.ephemeral.remove(SESSION_HANDLE_KEY) {
            tracing::warn!(%err, "ephemeral session clear failed");
        }
        if let Err(err) = self.durable.remove(SESSION_HANDLE_KEY) {
            tracing::warn!(%err, "durable session clear failed");
        }
    }
}
