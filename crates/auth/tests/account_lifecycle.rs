//! Black-box lifecycle tests: several live contexts (tabs) over one shared
//! durable store, converging through their synchronization points.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;

use daybook_auth::{AccountManager, AuthError, SessionRepository};
use daybook_core::{Email, ManualClock, SessionId};
use daybook_store::{KvStore, MemoryKv, SharedStore, StoreError};

fn open_context(store: &SharedStore, clock: &Arc<ManualClock>) -> AccountManager {
    let ctx = store.context();
    let changes = ctx.subscribe();
    AccountManager::open(
        Arc::new(ctx),
        Arc::new(MemoryKv::new()),
        changes,
        clock.clone(),
    )
}

fn forge_token(email: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::json!({ "email": email }).to_string());
    format!("{header}.{body}.sig")
}

#[test]
fn password_change_logs_out_the_other_tab() {
    daybook_observability::init();

    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab_a = open_context(&store, &clock);
    tab_a.register("a@x.com", "Secret1!pass", true).unwrap();

    let mut tab_b = open_context(&store, &clock);
    tab_b.login("a@x.com", "Secret1!pass", true).unwrap();
    let b_session = tab_b.session_id().unwrap();

    // Both tabs hold valid sessions until A rotates the password.
    tab_a.synchronize();
    assert!(tab_a.is_authenticated());

    tab_a.change_password("Secret1!pass", "Rotated!9pass").unwrap();

    tab_b.synchronize();
    assert!(!tab_b.is_authenticated());
    assert_eq!(tab_b.user_email(), None);

    // A itself is unaffected: its id is the one that survived.
    tab_a.synchronize();
    assert!(tab_a.is_authenticated());

    let sessions = SessionRepository::new(Arc::new(store.context()));
    assert!(!sessions.is_allowed(&Email::new("a@x.com"), &b_session));
}

#[test]
fn deletion_in_one_tab_reaches_the_other() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab_a = open_context(&store, &clock);
    tab_a.register("a@x.com", "Secret1!pass", true).unwrap();

    let mut tab_b = open_context(&store, &clock);
    tab_b.login("a@x.com", "Secret1!pass", false).unwrap();

    tab_a.delete_account().unwrap();

    tab_b.synchronize();
    assert!(!tab_b.is_authenticated());
}

#[test]
fn deactivation_in_one_tab_becomes_visible_in_the_other() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab_a = open_context(&store, &clock);
    tab_a.register("a@x.com", "Secret1!pass", true).unwrap();

    let mut tab_b = open_context(&store, &clock);
    tab_b.login("a@x.com", "Secret1!pass", false).unwrap();
    assert_eq!(tab_b.scheduled_deletion_date(), None);

    let delete_at = tab_a.deactivate_account().unwrap();

    tab_b.synchronize();
    assert!(tab_b.is_authenticated());
    assert_eq!(tab_b.scheduled_deletion_date(), Some(delete_at));
}

#[test]
fn lapsed_deadline_forces_the_idle_tab_to_anonymous() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab = open_context(&store, &clock);
    tab.register("a@x.com", "Secret1!pass", true).unwrap();
    tab.deactivate_account().unwrap();

    clock.advance(Duration::days(31));

    // Nothing touched the account in the meantime; the next checkpoint both
    // purges and logs out.
    tab.synchronize();
    assert!(!tab.is_authenticated());

    let mut fresh = open_context(&store, &clock);
    assert!(!fresh.is_authenticated());
    fresh.register("a@x.com", "Brand!New9", false).unwrap();
    assert_eq!(fresh.scheduled_deletion_date(), None);
}

#[test]
fn logout_revokes_only_the_acting_session() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab_a = open_context(&store, &clock);
    tab_a.register("a@x.com", "Secret1!pass", true).unwrap();

    let mut tab_b = open_context(&store, &clock);
    tab_b.login("a@x.com", "Secret1!pass", false).unwrap();

    tab_b.logout();

    tab_a.synchronize();
    assert!(tab_a.is_authenticated());
}

#[test]
fn google_login_round_trip_across_tabs() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab_a = open_context(&store, &clock);
    tab_a
        .login_with_google(&forge_token("G@X.com"), true)
        .unwrap();
    assert_eq!(tab_a.user_email().unwrap().as_str(), "g@x.com");

    // The remembered session resumes in a brand-new tab.
    let tab_b = open_context(&store, &clock);
    assert!(tab_b.is_authenticated());
    assert_eq!(tab_b.user_email().unwrap().as_str(), "g@x.com");
}

/// Durable store that accepts reads but rejects every write.
struct ReadOnlyKv {
    inner: MemoryKv,
}

impl KvStore for ReadOnlyKv {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::WriteRejected("store is full".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::WriteRejected("store is full".into()))
    }
}

#[test]
fn rejected_writes_do_not_abort_operations() {
    let clock: Arc<ManualClock> = Arc::new(ManualClock::starting_now());
    let durable = Arc::new(ReadOnlyKv {
        inner: MemoryKv::new(),
    });
    let (_tx, rx) = std::sync::mpsc::channel();

    let mut mgr = AccountManager::open(
        durable,
        Arc::new(MemoryKv::new()),
        daybook_store::Subscription::new(rx),
        clock,
    );

    // The in-memory effect stands; only durability is lost.
    mgr.register("a@x.com", "Secret1!pass", true).unwrap();
    assert!(mgr.is_authenticated());
    assert_eq!(mgr.user_email().unwrap().as_str(), "a@x.com");
}

#[test]
fn a_resumed_tab_shares_the_session_it_picked_up() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab_a = open_context(&store, &clock);
    tab_a.register("a@x.com", "Secret1!pass", true).unwrap();
    let a_session = tab_a.session_id().unwrap();

    // The new tab resumes the remembered session: same id, same account.
    let mut tab_b = open_context(&store, &clock);
    assert_eq!(tab_b.session_id(), Some(a_session));

    // Revoking the last id empties the account's set, and an empty set is
    // unrestricted: the other holder of the id stays signed in. Parity
    // behaviour, pinned deliberately (see DESIGN.md).
    tab_b.logout();
    tab_a.synchronize();
    assert!(tab_a.is_authenticated());
}

#[test]
fn register_requires_a_session_to_be_tracked() {
    let store = SharedStore::new();
    let clock = Arc::new(ManualClock::starting_now());

    let mut tab = open_context(&store, &clock);
    tab.register("a@x.com", "Secret1!pass", false).unwrap();
    let id = tab.session_id().unwrap();

    let sessions = SessionRepository::new(Arc::new(store.context()));
    assert!(sessions.is_allowed(&Email::new("a@x.com"), &id));
    assert!(!sessions.is_allowed(&Email::new("a@x.com"), &SessionId::new()));
}
