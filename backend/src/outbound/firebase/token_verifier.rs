//! Firebase ID token verification against Google's published signing keys.
//!
//! Tokens are RS256 JWTs. The key set is fetched with `reqwest`, cached in a
//! `DashMap` until its TTL lapses, and refreshed once when a token names a
//! `kid` the cache does not know (key rotation).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use mockable::Clock;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::dto::FirebaseClaims;
use crate::domain::VerifiedIdentity;
use crate::domain::ports::{TokenVerifier, TokenVerifierError};

/// Google's JWKS endpoint for Firebase ID token signing keys.
pub const DEFAULT_FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Settings for [`FirebaseTokenVerifier`].
#[derive(Debug, Clone)]
pub struct FirebaseVerifierConfig {
    /// Firebase project id; tokens must name it as audience and issuer.
    pub project_id: String,
    pub jwks_url: Url,
    /// How long a fetched key set is trusted.
    pub jwks_ttl: Duration,
    /// Leeway applied to `exp`, `iat` and `auth_time`.
    pub clock_skew: Duration,
    /// Timeout for key set requests.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
struct CachedKeys {
    keys: JwkSet,
    expires_at: DateTime<Utc>,
}

/// Verifies Firebase ID tokens.
#[derive(Clone)]
pub struct FirebaseTokenVerifier {
    client: Client,
    config: FirebaseVerifierConfig,
    issuer: String,
    cache: Arc<DashMap<String, CachedKeys>>,
    clock: Arc<dyn Clock>,
}

impl FirebaseTokenVerifier {
    /// Build a verifier with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        config: FirebaseVerifierConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let issuer = format!("{ISSUER_PREFIX}{}", config.project_id);
        Ok(Self {
            client,
            config,
            issuer,
            cache: Arc::new(DashMap::new()),
            clock,
        })
    }

    fn cache_key(&self) -> &str {
        self.config.jwks_url.as_str()
    }

    fn cached_keys(&self) -> Option<JwkSet> {
        let entry = self.cache.get(self.cache_key())?;
        (entry.expires_at > self.clock.utc()).then(|| entry.keys.clone())
    }

    async fn refresh_keys(&self) -> Result<JwkSet, TokenVerifierError> {
        let response = self
            .client
            .get(self.config.jwks_url.clone())
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TokenVerifierError::keys_unavailable(format!(
                "status {}",
                status.as_u16()
            )));
        }
        let keys: JwkSet = response.json().await.map_err(map_transport_error)?;
        let ttl = chrono::Duration::from_std(self.config.jwks_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        self.cache.insert(
            self.cache_key().to_owned(),
            CachedKeys {
                keys: keys.clone(),
                expires_at: self.clock.utc() + ttl,
            },
        );
        debug!(count = keys.keys.len(), "refreshed firebase signing keys");
        Ok(keys)
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, TokenVerifierError> {
        if let Some(key) = self.cached_keys().as_ref().and_then(|keys| find_key(keys, kid)) {
            return decoding_key_from(key);
        }
        let refreshed = self.refresh_keys().await?;
        let key = find_key(&refreshed, kid)
            .ok_or_else(|| TokenVerifierError::invalid("unknown signing key"))?;
        decoding_key_from(key)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.config.project_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);
        validation.leeway = self.config.clock_skew.as_secs();
        validation
    }

    fn check_auth_time(&self, claims: &FirebaseClaims) -> Result<(), TokenVerifierError> {
        let leeway = i64::try_from(self.config.clock_skew.as_secs()).unwrap_or(i64::MAX);
        let now = self.clock.utc().timestamp();
        match claims.auth_time {
            Some(auth_time) if auth_time <= now.saturating_add(leeway) => Ok(()),
            Some(_) => Err(TokenVerifierError::invalid("auth_time is in the future")),
            None => Err(TokenVerifierError::invalid("auth_time is missing")),
        }
    }
}

fn find_key<'a>(keys: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    keys.keys
        .iter()
        .find(|key| key.common.key_id.as_deref() == Some(kid))
}

fn decoding_key_from(key: &Jwk) -> Result<DecodingKey, TokenVerifierError> {
    if !matches!(key.algorithm, AlgorithmParameters::RSA(_)) {
        return Err(TokenVerifierError::invalid("signing key is not an RSA key"));
    }
    DecodingKey::from_jwk(key).map_err(|err| TokenVerifierError::invalid(err.to_string()))
}

fn map_transport_error(error: reqwest::Error) -> TokenVerifierError {
    warn!(%error, "failed to fetch firebase signing keys");
    TokenVerifierError::keys_unavailable(error.to_string())
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenVerifierError {
    match error.kind() {
        ErrorKind::ExpiredSignature => TokenVerifierError::expired(),
        ErrorKind::InvalidIssuer => TokenVerifierError::invalid("unexpected issuer"),
        ErrorKind::InvalidAudience => TokenVerifierError::invalid("unexpected audience"),
        ErrorKind::ImmatureSignature => TokenVerifierError::invalid("token not yet valid"),
        _ => TokenVerifierError::invalid(error.to_string()),
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, TokenVerifierError> {
        let header = decode_header(token).map_err(map_jwt_error)?;
        if header.alg != Algorithm::RS256 {
            return Err(TokenVerifierError::invalid("unsupported signing algorithm"));
        }
        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| TokenVerifierError::invalid("token has no key id"))?;

        let key = self.decoding_key(kid).await?;
        let data =
            decode::<FirebaseClaims>(token, &key, &self.validation()).map_err(map_jwt_error)?;
        self.check_auth_time(&data.claims)?;
        data.claims
            .into_identity()
            .map_err(TokenVerifierError::invalid)
    }
}
