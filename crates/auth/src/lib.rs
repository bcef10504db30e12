//! `daybook-auth` — account and session core of the Daybook organizer.
//!
//! Everything else in the application is thin forms over per-account
//! persisted records; this crate owns the one real state machine: credential
//! validation, multi-context session tracking, soft deletion with a purge
//! window, and cross-context session invalidation.

pub mod credentials;
pub mod deactivation;
pub mod error;
pub mod handle;
pub mod manager;
pub mod meta;
pub mod sessions;
pub mod token;

mod records;

pub use credentials::{ADMIN_EMAIL, AccountCredential, CredentialRepository, EXTERNAL_SECRET};
pub use deactivation::{DELETION_WINDOW_DAYS, DeactivationRepository};
pub use error::{AuthError, AuthResult};
pub use handle::ActiveSessionHandle;
pub use manager::{AccessDecision, AccountManager};
pub use meta::AccountMetaRepository;
pub use sessions::SessionRepository;
