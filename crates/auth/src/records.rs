//! Persisted record layout.
//!
//! One record per logical map, each a JSON object keyed by normalized email,
//! plus one record for the current context's own session identifier.
//! Records are read-modify-written whole; across contexts the last writer
//! wins (accepted limitation of the device-local store).

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use daybook_core::Email;
use daybook_store::KvStore;

pub(crate) const CREDENTIALS_KEY: &str = "daybook.accounts.credentials";
pub(crate) const META_KEY: &str = "daybook.accounts.meta";
pub(crate) const DEACTIVATION_KEY: &str = "daybook.accounts.deactivation";
pub(crate) const SESSIONS_KEY: &str = "daybook.accounts.sessions";
pub(crate) const SESSION_HANDLE_KEY: &str = "daybook.session.current";

pub(crate) fn load_map<T>(kv: &dyn KvStore, key: &str) -> HashMap<Email, T>
where
    T: DeserializeOwned,
{
    let Some(raw) = kv.get(key) else {
        return HashMap::new();
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!(key, %err, "discarding undecodable record");
            HashMap::new()
        }
    }
}

/// Best-effort persist: a rejected write is logged, the caller's in-memory
/// effect stands and durability is simply lost.
pub(crate) fn store_map<T>(kv: &dyn KvStore, key: &str, map: &HashMap<Email, T>)
where
    T: Serialize,
{
    match serde_json::to_string(map) {
        Ok(raw) => {
            if let Err(err) = kv.set(key, &raw) {
                tracing::warn!(key, %err, "durable write failed");
            }
        }
        Err(err) => tracing::warn!(key, %err, "failed to encode record"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_store::MemoryKv;

    #[test]
    fn missing_record_reads_as_empty_map() {
        let kv = MemoryKv::new();
        let map: HashMap<Email, String> = load_map(&kv, CREDENTIALS_KEY);
        assert!(map.is_empty());
    }

    #[test]
    fn undecodable_record_reads_as_empty_map() {
        let kv = MemoryKv::new();
        kv.set(CREDENTIALS_KEY, "not json").unwrap();
        let map: HashMap<Email, String> = load_map(&kv, CREDENTIALS_KEY);
        assert!(map.is_empty());
    }

    #[test]
    fn round_trips_a_map() {
        let kv = MemoryKv::new();
        let mut map = HashMap::new();
        map.insert(Email::new("a@x.com"), "secret".to_string());
        store_map(&kv, CREDENTIALS_KEY, &map);

        let back: HashMap<Email, String> = load_map(&kv, CREDENTIALS_KEY);
        assert_eq!(back, map);
    }
}
