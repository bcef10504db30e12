//! Normalized account email, the unique account key.

use serde::{Deserialize, Serialize};

/// Account email, normalized on construction (trimmed, lowercased).
///
/// Two differently-cased spellings of the same address are the same account,
/// so every lookup and write must go through this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize a raw address. Normalization is idempotent.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Basic shape check, applied at registration time only.
    pub fn is_wellformed(&self) -> bool {
        !self.0.is_empty() && self.0.contains('@')
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
