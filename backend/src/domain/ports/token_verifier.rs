//! Port for verifying identity provider bearer tokens.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::VerifiedIdentity;

use super::define_port_error;

define_port_error! {
    /// Errors raised while verifying a bearer token.
    pub enum TokenVerifierError {
        /// The token is malformed, badly signed, or has the wrong claims.
        Invalid { message: String } => "token rejected: {message}",
        /// The token was valid once but has expired.
        Expired => "token expired",
        /// Signing keys could not be fetched.
        KeysUnavailable { message: String } => "signing keys unavailable: {message}",
    }
}

/// Verifies ID tokens and extracts the identity they assert.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return the identity it carries.
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, TokenVerifierError>;
}

/// Verifier that accepts a fixed set of opaque tokens.
///
/// Unknown tokens are rejected as invalid.
#[derive(Debug, Default, Clone)]
pub struct FixtureTokenVerifier {
    identities: HashMap<String, VerifiedIdentity>,
}

impl FixtureTokenVerifier {
    /// Accept `token` as asserting `identity`.
    #[must_use]
    pub fn with_identity(mut self, token: impl Into<String>, identity: VerifiedIdentity) -> Self {
        self.identities.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl TokenVerifier for FixtureTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, TokenVerifierError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| TokenVerifierError::invalid("unknown fixture token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FirebaseUid;

    #[tokio::test]
    async fn fixture_verifier_only_knows_registered_tokens() {
        let identity = VerifiedIdentity {
            uid: FirebaseUid::new("uid-1").expect("valid uid"),
            email: None,
            name: None,
        };
        let verifier = FixtureTokenVerifier::default().with_identity("good", identity.clone());

        assert_eq!(verifier.verify("good").await, Ok(identity));
        assert!(matches!(
            verifier.verify("bad").await,
            Err(TokenVerifierError::Invalid { .. })
        ));
    }
}
