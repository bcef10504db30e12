//! Account lifecycle orchestration.
//!
//! One [`AccountManager`] exists per execution context (tab/process). It
//! composes the repositories, the active-session handle and the store-change
//! subscription into the operations the organizer pages consume. Contexts
//! sharing one durable store converge through [`AccountManager::synchronize`]:
//! a session revoked anywhere stops working everywhere at the revoked
//! context's next synchronization point.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use daybook_core::{Clock, Email, SessionId};
use daybook_store::{KvStore, StoreChange, Subscription};

use crate::credentials::{ADMIN_EMAIL, CredentialRepository, EXTERNAL_SECRET};
use crate::deactivation::DeactivationRepository;
use crate::error::{AuthError, AuthResult};
use crate::handle::ActiveSessionHandle;
use crate::meta::AccountMetaRepository;
use crate::sessions::SessionRepository;
use crate::token;

const MIN_SECRET_LEN: usize = 8;

/// Outcome of the deactivation checkpoint for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub delete_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct Authenticated {
    email: Email,
    session_id: SessionId,
    is_admin: bool,
    created_at: DateTime<Utc>,
    scheduled_deletion: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
enum LiveState {
    Anonymous,
    Authenticated(Authenticated),
}

/// The account-lifecycle state machine for one execution context.
pub struct AccountManager {
    credentials: CredentialRepository,
    meta: AccountMetaRepository,
    deactivation: DeactivationRepository,
    sessions: SessionRepository,
    handle: ActiveSessionHandle,
    clock: Arc<dyn Clock>,
    changes: Subscription<StoreChange>,
    state: LiveState,
}

impl AccountManager {
    /// Open a manager over one context's stores and resume any remembered
    /// session (the context-initialization checkpoint).
    pub fn open(
        durable: Arc<dyn KvStore>,
        ephemeral: Arc<dyn KvStore>,
        changes: Subscription<StoreChange>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut manager = Self {
            credentials: CredentialRepository::new(Arc::clone(&durable)),
            meta: AccountMetaRepository::new(Arc::clone(&durable)),
            deactivation: DeactivationRepository::new(Arc::clone(&durable)),
            sessions: SessionRepository::new(Arc::clone(&durable)),
            handle: ActiveSessionHandle::new(ephemeral, durable),
            clock,
            changes,
            state: LiveState::Anonymous,
        };
        manager.resume();
        manager
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Password login. Reactivates an account pending deletion.
    pub fn login(&mut self, email: &str, secret: &str, remember: bool) -> AuthResult<()> {
        let email = Email::new(email);
        let cred = self
            .credentials
            .find(&email)
            .ok_or(AuthError::InvalidCredential)?;
        // External-identity accounts hold no local password.
        if cred.is_external() || cred.secret != secret {
            return Err(AuthError::InvalidCredential);
        }

        let now = self.clock.now();
        let decision = self.evaluate(&email, now);
        if !decision.allowed {
            return Err(AuthError::AccountInaccessible);
        }
        if decision.delete_at.is_some() {
            // Logging back in before the deadline cancels the pending purge.
            self.deactivation.clear(&email);
            tracing::debug!(%email, "pending deletion cancelled by login");
        }

        self.open_session(email, remember, now);
        Ok(())
    }

    /// Create an account and log it in.
    pub fn register(&mut self, email: &str, secret: &str, remember: bool) -> AuthResult<()> {
        let email = Email::new(email);
        if !email.is_wellformed() {
            return Err(AuthError::InvalidCredential);
        }
        check_secret_policy(secret, None)?;

        let now = self.clock.now();
        // A lapsed pending-deletion account purges here, freeing its email
        // for a brand-new registration.
        self.evaluate(&email, now);
        if self.credentials.find(&email).is_some() {
            return Err(AuthError::AccountExists);
        }

        self.credentials.upsert(&email, secret);
        self.open_session(email, remember, now);
        Ok(())
    }

    /// Login via an externally issued identity token.
    ///
    /// Proceeds as a combined login/registration: the account is created
    /// with the reserved external sentinel if it does not exist. Only the
    /// token's email claim is consumed; see [`token::email_claim`] for the
    /// verification boundary.
    pub fn login_with_google(&mut self, token: &str, remember: bool) -> AuthResult<()> {
        let email = token::email_claim(token)?;

        let now = self.clock.now();
        let decision = self.evaluate(&email, now);
        if decision.delete_at.is_some() {
            self.deactivation.clear(&email);
            tracing::debug!(%email, "pending deletion cancelled by login");
        }
        if self.credentials.find(&email).is_none() {
            self.credentials.upsert(&email, EXTERNAL_SECRET);
        }

        self.open_session(email, remember, now);
        Ok(())
    }

    /// Revoke the current session and return to anonymous. A no-op when
    /// nothing is signed in.
    pub fn logout(&mut self) {
        if let LiveState::Authenticated(auth) = &self.state {
            self.sessions.revoke(&auth.email, &auth.session_id);
        }
        self.handle.clear();
        self.state = LiveState::Anonymous;
    }

    /// Check a password against the signed-in account.
    pub fn verify_password(&self, secret: &str) -> AuthResult<bool> {
        let auth = self.authenticated()?;
        Ok(self
            .credentials
            .find(&auth.email)
            .is_some_and(|cred| !cred.is_external() && cred.secret == secret))
    }

    /// Change the signed-in account's password.
    ///
    /// Invalidates every session for the account except the acting one.
    /// Rejected for the administrator account: its credential is fixed, and
    /// an upserted record would be permanently shadowed by the fixed pair.
    pub fn change_password(&mut self, old: &str, new: &str) -> AuthResult<()> {
        let auth = self.authenticated()?.clone();
        if auth.is_admin {
            return Err(AuthError::AdminImmutable);
        }
        let cred = self
            .credentials
            .find(&auth.email)
            .ok_or(AuthError::SecretMismatch)?;
        if cred.is_external() || cred.secret != old {
            return Err(AuthError::SecretMismatch);
        }
        check_secret_policy(new, Some(old))?;

        self.credentials.upsert(&auth.email, new);
        self.sessions.replace_all(&auth.email, vec![auth.session_id]);
        tracing::debug!(email = %auth.email, "password changed; other sessions dropped");
        Ok(())
    }

    /// Schedule the signed-in account for deletion; returns the purge
    /// deadline. The session stays valid throughout the window.
    pub fn deactivate_account(&mut self) -> AuthResult<DateTime<Utc>> {
        let now = self.clock.now();
        let LiveState::Authenticated(auth) = &mut self.state else {
            return Err(AuthError::NotAuthenticated);
        };
        if auth.is_admin {
            return Err(AuthError::AdminImmutable);
        }
        let delete_at = self.deactivation.schedule(&auth.email, now);
        auth.scheduled_deletion = Some(delete_at);
        tracing::debug!(email = %auth.email, %delete_at, "account deactivated");
        Ok(delete_at)
    }

    /// Purge the signed-in account immediately, bypassing the grace window.
    /// Rejected for the administrator account, which cannot be removed.
    pub fn delete_account(&mut self) -> AuthResult<()> {
        let auth = self.authenticated()?.clone();
        if auth.is_admin {
            return Err(AuthError::AdminImmutable);
        }
        self.purge(&auth.email);
        self.handle.clear();
        self.state = LiveState::Anonymous;
        tracing::debug!(email = %auth.email, "account deleted");
        Ok(())
    }

    /// The context's synchronization point.
    ///
    /// Drains pending cross-context notifications, then re-validates the
    /// current session: the deletion deadline may have lapsed, the account
    /// may have been removed elsewhere, or another context may have revoked
    /// this session id. A revoked session logs out locally without trying
    /// to revoke the id remotely again.
    pub fn synchronize(&mut self) {
        self.changes.drain();
        let LiveState::Authenticated(auth) = &self.state else {
            return;
        };
        let auth = auth.clone();

        let now = self.clock.now();
        let decision = self.evaluate(&auth.email, now);
        if !decision.allowed
            || self.credentials.find(&auth.email).is_none()
            || !self.sessions.is_allowed(&auth.email, &auth.session_id)
        {
            tracing::debug!(email = %auth.email, "session no longer valid; logging out locally");
            self.handle.clear();
            self.state = LiveState::Anonymous;
            return;
        }

        // Another context may have deactivated or reactivated the account.
        if let LiveState::Authenticated(live) = &mut self.state {
            live.scheduled_deletion = decision.delete_at;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read-only surface for the organizer pages
    // ─────────────────────────────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, LiveState::Authenticated(_))
    }

    pub fn is_admin(&self) -> bool {
        matches!(&self.state, LiveState::Authenticated(auth) if auth.is_admin)
    }

    pub fn user_email(&self) -> Option<&Email> {
        match &self.state {
            LiveState::Authenticated(auth) => Some(&auth.email),
            LiveState::Anonymous => None,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            LiveState::Authenticated(auth) => Some(auth.created_at),
            LiveState::Anonymous => None,
        }
    }

    pub fn scheduled_deletion_date(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            LiveState::Authenticated(auth) => auth.scheduled_deletion,
            LiveState::Anonymous => None,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match &self.state {
            LiveState::Authenticated(auth) => Some(auth.session_id),
            LiveState::Anonymous => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn authenticated(&self) -> AuthResult<&Authenticated> {
        match &self.state {
            LiveState::Authenticated(auth) => Ok(auth),
            LiveState::Anonymous => Err(AuthError::NotAuthenticated),
        }
    }

    /// Context initialization: pick up a remembered session, if any.
    fn resume(&mut self) {
        let Some(id) = self.handle.read() else {
            return;
        };
        let Some(email) = self.sessions.find_account(&id) else {
            self.handle.clear();
            return;
        };

        let now = self.clock.now();
        let decision = self.evaluate(&email, now);
        if !decision.allowed || self.credentials.find(&email).is_none() {
            self.handle.clear();
            return;
        }

        let created_at = self.meta.ensure(&email, now);
        self.state = LiveState::Authenticated(Authenticated {
            is_admin: email.as_str() == ADMIN_EMAIL,
            email,
            session_id: id,
            created_at,
            // A resumed session keeps showing its pending deletion date;
            // only an explicit login reactivates.
            scheduled_deletion: decision.delete_at,
        });
    }

    /// The deactivation checkpoint: report the pending deletion date,
    /// purging the account when the deadline has passed. Invoked at context
    /// initialization, every login/registration attempt, and every
    /// synchronization point. Never driven by a timer.
    pub fn evaluate(&self, email: &Email, now: DateTime<Utc>) -> AccessDecision {
        match self.deactivation.get(email) {
            None => AccessDecision {
                allowed: true,
                delete_at: None,
            },
            Some(delete_at) if delete_at > now => AccessDecision {
                allowed: true,
                delete_at: Some(delete_at),
            },
            Some(delete_at) => {
                tracing::debug!(%email, %delete_at, "deletion deadline passed; purging account");
                self.purge(email);
                AccessDecision {
                    allowed: false,
                    delete_at: None,
                }
            }
        }
    }

    /// Remove every record for the account. Afterwards the email is
    /// indistinguishable from one that never registered.
    fn purge(&self, email: &Email) {
        self.credentials.remove(email);
        self.meta.remove(email);
        self.deactivation.clear(email);
        self.sessions.clear(email);
    }

    /// Common tail of every successful login/registration.
    fn open_session(&mut self, email: Email, remember: bool, now: DateTime<Utc>) {
        // A login over a live session retires the previous id; otherwise it
        // would linger in the old account's session set forever.
        if let LiveState::Authenticated(prev) = &self.state {
            self.sessions.revoke(&prev.email, &prev.session_id);
        }
        let created_at = self.meta.ensure(&email, now);
        let id = SessionId::new();
        self.sessions.register(&email, &id);
        self.handle.persist(&id, remember);
        self.state = LiveState::Authenticated(Authenticated {
            is_admin: email.as_str() == ADMIN_EMAIL,
            email,
            session_id: id,
            created_at,
            scheduled_deletion: None,
        });
    }
}

fn check_secret_policy(new: &str, previous: Option<&str>) -> AuthResult<()> {
    if new.is_empty() {
        return Err(AuthError::weak_secret("password must not be empty"));
    }
    if new.len() < MIN_SECRET_LEN {
        return Err(AuthError::weak_secret(format!(
            "password must be at least {MIN_SECRET_LEN} characters"
        )));
    }
    if previous.is_some_and(|old| old == new) {
        return Err(AuthError::weak_secret(
            "new password must differ from the old one",
        ));
    }
    Ok(())
}
