//! Back-office users and the identities that authenticate them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Error, ErrorCode, OrganizationId, UserId};

/// Maximum length of a Firebase UID.
pub const FIREBASE_UID_MAX: usize = 128;
/// Maximum length of a display name.
pub const DISPLAY_NAME_MAX: usize = 80;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 254;

/// Validation errors for user value objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("firebase uid must not be empty")]
    EmptyFirebaseUid,
    #[error("firebase uid must be at most {max} characters")]
    FirebaseUidTooLong { max: usize },
    #[error("email must be a valid address")]
    InvalidEmail,
    #[error("display name must not be empty")]
    EmptyDisplayName,
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("role must be admin or member")]
    UnknownRole,
}

/// Identity provider subject identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FirebaseUid(String);

impl FirebaseUid {
    /// Validate and wrap a UID.
    pub fn new(uid: impl Into<String>) -> Result<Self, UserValidationError> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err(UserValidationError::EmptyFirebaseUid);
        }
        if uid.chars().count() > FIREBASE_UID_MAX {
            return Err(UserValidationError::FirebaseUidTooLong {
                max: FIREBASE_UID_MAX,
            });
        }
        Ok(Self(uid))
    }
}

impl AsRef<str> for FirebaseUid {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FirebaseUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FirebaseUid> for String {
    fn from(value: FirebaseUid) -> Self {
        value.0
    }
}

impl TryFrom<String> for FirebaseUid {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lower-cased email address.
///
/// Only the shape `local@domain` is checked; deliverability is the identity
/// provider's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalise and validate an address.
    ///
    /// # Examples
    /// ```
    /// use backoffice::domain::Email;
    ///
    /// let email = Email::new("  Ada@Example.COM ").unwrap();
    /// assert_eq!(email.as_ref(), "ada@example.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.chars().count() > EMAIL_MAX || normalised.contains(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        match normalised.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(normalised))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Human readable name shown in the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Trim and validate a display name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Role of a user inside their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(UserValidationError::UnknownRole),
        }
    }
}

/// Identity asserted by a verified ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: FirebaseUid,
    pub email: Option<Email>,
    pub name: Option<String>,
}

/// Registered back-office user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, format = Uuid)]
    pub id: UserId,
    #[schema(value_type = String)]
    pub firebase_uid: FirebaseUid,
    #[schema(value_type = String, example = "ada@example.com")]
    pub email: Email,
    #[schema(value_type = String, example = "Ada Lovelace")]
    pub display_name: DisplayName,
    pub role: Role,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub organization_id: Option<OrganizationId>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Resolve the tenant this user acts within.
    ///
    /// Users who have not created or joined an organization cannot reach any
    /// organization-scoped resource.
    pub fn tenant(&self) -> Result<TenantContext, Error> {
        let organization_id = self.organization_id.ok_or_else(|| {
            Error::new(
                ErrorCode::NoOrganization,
                "user does not belong to an organization",
            )
        })?;
        Ok(TenantContext {
            user_id: self.id,
            organization_id,
            role: self.role,
        })
    }
}

/// The caller of an organization-scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub role: Role,
}

impl TenantContext {
    /// Fail with `FORBIDDEN` unless the caller is an organization admin.
    pub fn require_admin(&self) -> Result<(), Error> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Member => Err(Error::forbidden(
                "only organization admins may perform this action",
            )),
        }
    }
}

#[cfg(test)]
mod tests;
