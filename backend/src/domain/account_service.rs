//! Authentication and registration service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountService, TokenVerifier, TokenVerifierError, UserRepository, UserRepositoryError,
};
use crate::domain::{DisplayName, Error, ErrorCode, Role, User, UserId, VerifiedIdentity};

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::Duplicate => {
            Error::new(ErrorCode::UserAlreadyExists, "user is already registered")
        }
    }
}

fn map_token_error(error: TokenVerifierError) -> Error {
    match error {
        TokenVerifierError::Invalid { message } => {
            warn!(%message, "rejected bearer token");
            Error::new(ErrorCode::InvalidToken, "invalid authentication token")
        }
        TokenVerifierError::Expired => {
            Error::new(ErrorCode::InvalidToken, "authentication token expired")
        }
        TokenVerifierError::KeysUnavailable { message } => {
            Error::service_unavailable(format!("token signing keys unavailable: {message}"))
        }
    }
}

/// Account service implementing the driving port.
#[derive(Clone)]
pub struct AccountServiceImpl<V, U> {
    verifier: Arc<V>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<V, U> AccountServiceImpl<V, U> {
    /// Create a service verifying tokens with `verifier` and storing users in
    /// `users`.
    pub fn new(verifier: Arc<V>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            verifier,
            users,
            clock,
        }
    }
}

impl<V, U> AccountServiceImpl<V, U>
where
    V: TokenVerifier,
    U: UserRepository,
{
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, Error> {
        if token.trim().is_empty() {
            return Err(Error::unauthorized("missing bearer token"));
        }
        self.verifier.verify(token).await.map_err(map_token_error)
    }

    fn pick_display_name(
        requested: Option<String>,
        identity: &VerifiedIdentity,
        fallback: &str,
    ) -> Result<DisplayName, Error> {
        if let Some(requested) = requested {
            return DisplayName::new(requested).map_err(|err| {
                Error::invalid_request(err.to_string()).with_details(serde_json::json!({
                    "field": "displayName",
                    "code": "invalid_display_name",
                }))
            });
        }
        identity
            .name
            .as_deref()
            .and_then(|name| DisplayName::new(name).ok())
            .or_else(|| DisplayName::new(fallback).ok())
            .ok_or_else(|| Error::invalid_request("display name is required"))
    }
}

#[async_trait]
impl<V, U> AccountService for AccountServiceImpl<V, U>
where
    V: TokenVerifier,
    U: UserRepository,
{
    async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let identity = self.verify(token).await?;
        self.users
            .find_by_firebase_uid(&identity.uid)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| {
                Error::new(
                    ErrorCode::UserNotRegistered,
                    "user is not registered; call /auth/register first",
                )
            })
    }

    async fn register(&self, token: &str, display_name: Option<String>) -> Result<User, Error> {
        let identity = self.verify(token).await?;
        let email = identity.email.clone().ok_or_else(|| {
            Error::new(
                ErrorCode::EmailRequired,
                "the identity provider did not supply an email address",
            )
        })?;
        let local_part = email.as_ref().split('@').next().unwrap_or_default().to_owned();
        let display_name = Self::pick_display_name(display_name, &identity, &local_part)?;

        if self
            .users
            .find_by_firebase_uid(&identity.uid)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(Error::new(
                ErrorCode::UserAlreadyExists,
                "user is already registered",
            ));
        }

        let user = User {
            id: UserId::random(),
            firebase_uid: identity.uid,
            email,
            display_name,
            role: Role::Member,
            organization_id: None,
            created_at: self.clock.utc(),
        };
        self.users.insert(&user).await.map_err(map_user_error)?;
        info!(user_id = %user.id, "registered user");
        Ok(user)
    }
}
