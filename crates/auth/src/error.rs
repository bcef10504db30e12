//! Account error taxonomy.
//!
//! Every expected failure is a `Result` value; nothing in this crate panics
//! on an expected path. Storage write failures are not represented here:
//! they are logged where they happen and the in-memory effect of the
//! operation stands (see `daybook-store`).

use thiserror::Error;

/// Result type used across the account core.
pub type AuthResult<T> = Result<T, AuthError>;

/// Account-level error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Wrong email/secret pair (or malformed email at registration).
    #[error("invalid email or password")]
    InvalidCredential,

    /// Registration attempted for an email that already has an account.
    #[error("an account with this email already exists")]
    AccountExists,

    /// The account passed its deletion deadline and was purged.
    #[error("account is no longer accessible")]
    AccountInaccessible,

    /// A new password failed the minimum policy.
    #[error("password rejected: {0}")]
    WeakSecret(String),

    /// The old password supplied to a password change was incorrect.
    #[error("current password is incorrect")]
    SecretMismatch,

    /// An external identity token could not be decoded or carries no email.
    #[error("malformed identity token: {0}")]
    MalformedIdentityToken(String),

    /// An operation that requires a signed-in account was called anonymously.
    #[error("no account is signed in")]
    NotAuthenticated,

    /// A lifecycle mutation was attempted on the built-in administrator
    /// account, whose credential is fixed and lives outside the table.
    #[error("the administrator account cannot be modified")]
    AdminImmutable,
}

impl AuthError {
    pub fn weak_secret(msg: impl Into<String>) -> Self {
        Self::WeakSecret(msg.into())
    }

    pub fn malformed_token(msg: impl Into<String>) -> Self {
        Self::MalformedIdentityToken(msg.into())
    }
}
