//! Driving port for authentication and registration.

use async_trait::async_trait;

use crate::domain::{Error, User};

/// Maps bearer tokens to back-office users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Verify `token` and load the registered user it belongs to.
    ///
    /// # Errors
    ///
    /// - `INVALID_TOKEN` when verification fails.
    /// - `USER_NOT_REGISTERED` when the identity has no user record.
    async fn authenticate(&self, token: &str) -> Result<User, Error>;

    /// Register the identity behind `token` as a new user without an
    /// organization.
    ///
    /// The display name falls back to the token's name claim, then to the
    /// local part of the email address.
    ///
    /// # Errors
    ///
    /// - `USER_ALREADY_EXISTS` when the identity is already registered.
    /// - `EMAIL_REQUIRED` when the token carries no email.
    async fn register(&self, token: &str, display_name: Option<String>) -> Result<User, Error>;
}
