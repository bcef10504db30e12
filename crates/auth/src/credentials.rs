//! Login credentials.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use daybook_core::Email;
use daybook_store::KvStore;

use crate::records::{self, CREDENTIALS_KEY};

/// Fixed administrator login, checked before the persisted table and never
/// written to it. Registration of this email fails because `find` already
/// reports it taken.
pub const ADMIN_EMAIL: &str = "admin@daybook.app";
pub const ADMIN_SECRET: &str = "d4yb00k-0p3rat0r";

/// Reserved secret marking accounts authenticated through an external
/// identity provider; such accounts hold no local password.
pub const EXTERNAL_SECRET: &str = "__external_identity__";

/// One account's login credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredential {
    pub email: Email,
    pub secret: String,
}

impl AccountCredential {
    /// Externally-authenticated accounts cannot log in with a password.
    pub fn is_external(&self) -> bool {
        self.secret == EXTERNAL_SECRET
    }
}

/// Per-account login credentials, one JSON record in the durable store.
pub struct CredentialRepository {
    kv: Arc<dyn KvStore>,
}

impl CredentialRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Look up a credential. The administrator pair wins before the table;
    /// absence is represented, never thrown.
    pub fn find(&self, email: &Email) -> Option<AccountCredential> {
        if email.as_str() == ADMIN_EMAIL {
            return Some(AccountCredential {
                email: email.clone(),
                secret: ADMIN_SECRET.to_string(),
            });
        }
        let map: HashMap<Email, String> = records::load_map(self.kv.as_ref(), CREDENTIALS_KEY);
        map.get(email).map(|secret| AccountCredential {
            email: email.clone(),
            secret: secret.clone(),
        })
    }

    pub fn upsert(&self, email: &Email, secret: &str) {
        let mut map: HashMap<Email, String> = records::load_map(self.kv.as_ref(), CREDENTIALS_KEY);
        map.insert(email.clone(), secret.to_string());
        records::store_map(self.kv.as_ref(), CREDENTIALS_KEY, &map);
    }

    pub fn remove(&self, email: &Email) {
        let mut map: HashMap<Email, String> = records::load_map(self.kv.as_ref(), CREDENTIALS_KEY);
        if map.remove(email).is_some() {
            records::store_map(self.kv.as_ref(), CREDENTIALS_KEY, &map);
        }
    }
}
