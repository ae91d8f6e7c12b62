//! Port for user persistence.

use async_trait::async_trait;

use crate::domain::{Email, FirebaseUid, OrganizationId, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A user with the same Firebase UID already exists.
        Duplicate => "user already registered",
    }
}

/// Storage for back-office users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look a user up by identity provider UID.
    async fn find_by_firebase_uid(
        &self,
        uid: &FirebaseUid,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Look a user up by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Insert a new user. Fails with [`UserRepositoryError::Duplicate`] when
    /// the UID is taken.
    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError>;

    /// Members of an organization ordered by display name.
    async fn list_members(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<User>, UserRepositoryError>;

    /// Member of `organization_id` registered with `email`, if any.
    async fn find_member_by_email(
        &self,
        organization_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<User>, UserRepositoryError>;
}
