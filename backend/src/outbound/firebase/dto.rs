//! Claims carried by Firebase ID tokens.

use serde::Deserialize;

use crate::domain::{Email, FirebaseUid, VerifiedIdentity};

/// Claims read after the signature has been verified.
///
/// `iss`, `aud` and `exp` are checked by `jsonwebtoken` itself; the fields
/// below are the ones mapped into the domain identity.
#[derive(Debug, Deserialize)]
pub(super) struct FirebaseClaims {
    pub(super) sub: String,
    #[serde(default)]
    pub(super) auth_time: Option<i64>,
    #[serde(default)]
    pub(super) email: Option<String>,
    #[serde(default)]
    pub(super) email_verified: Option<bool>,
    #[serde(default)]
    pub(super) name: Option<String>,
}

impl FirebaseClaims {
    /// Map into a domain identity.
    ///
    /// The email is kept only when present, well formed and not explicitly
    /// unverified.
    pub(super) fn into_identity(self) -> Result<VerifiedIdentity, String> {
        let uid = FirebaseUid::new(self.sub).map_err(|err| format!("sub: {err}"))?;
        let email = match (self.email, self.email_verified) {
            (Some(_), Some(false)) | (None, _) => None,
            (Some(raw), _) => Email::new(raw).ok(),
        };
        let name = self
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        Ok(VerifiedIdentity { uid, email, name })
    }
}
