//! Organizations (tenants), their settings, invitations and join requests.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{Email, Error, InvitationId, JoinRequestId, OrganizationId, UserId, required_text};

/// Maximum length of an organization name.
pub const ORGANIZATION_NAME_MAX: usize = 120;
/// Currency used until an admin configures another one.
pub const DEFAULT_CURRENCY: &str = "USD";
/// Stock level at or below which a product is reported as running low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 5;

/// A tenant of the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[schema(value_type = String, format = Uuid)]
    pub id: OrganizationId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Validate the name and build a new organization.
    pub fn create(name: &str, now: DateTime<Utc>) -> Result<Self, Error> {
        Ok(Self {
            id: OrganizationId::random(),
            name: required_text("name", name, ORGANIZATION_NAME_MAX)?,
            created_at: now,
        })
    }
}

/// ISO-4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Accept three ASCII letters, upper-casing them.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(
                Error::invalid_request("currency must be a three-letter ISO code").with_details(
                    json!({ "field": "currency", "code": "invalid_currency", "value": raw }),
                ),
            )
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_owned())
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// Admin configuration of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSettings {
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = Option<String>)]
    pub contact_email: Option<Email>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = String, example = "USD")]
    pub currency: CurrencyCode,
    pub low_stock_threshold: u32,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationSettings {
    /// Settings created alongside a new organization.
    pub fn defaults(organization_id: OrganizationId, now: DateTime<Utc>) -> Self {
        Self {
            organization_id,
            contact_email: None,
            contact_phone: None,
            address: None,
            currency: CurrencyCode::default(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            updated_at: now,
        }
    }

    /// Apply an admin update.
    pub fn apply(&mut self, update: SettingsUpdate, now: DateTime<Utc>) {
        self.contact_email = update.contact_email;
        self.contact_phone = update.contact_phone;
        self.address = update.address;
        self.currency = update.currency;
        self.low_stock_threshold = update.low_stock_threshold;
        self.updated_at = now;
    }
}

/// Replacement values for [`OrganizationSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub contact_email: Option<Email>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub currency: CurrencyCode,
    pub low_stock_threshold: u32,
}

/// Unknown status string read from storage or a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Lifecycle of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
}

impl InvitationStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "revoked" => Ok(Self::Revoked),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// Invitation for an email address to join an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    #[schema(value_type = String, format = Uuid)]
    pub id: InvitationId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = String)]
    pub email: Email,
    #[schema(value_type = String, format = Uuid)]
    pub invited_by: UserId,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl JoinRequestStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for JoinRequestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's request to join an existing organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    #[schema(value_type = String, format = Uuid)]
    pub id: JoinRequestId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    pub message: Option<String>,
    pub status: JoinRequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("usd", "USD")]
    #[case(" eur ", "EUR")]
    fn currency_codes_are_upper_cased(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(CurrencyCode::new(raw).expect("valid").as_ref(), expected);
    }

    #[rstest]
    #[case("US")]
    #[case("US1")]
    #[case("DOLLAR")]
    fn currency_codes_reject_other_shapes(#[case] raw: &str) {
        assert!(CurrencyCode::new(raw).is_err());
    }

    #[rstest]
    fn defaults_use_usd_and_threshold_five() {
        let settings = OrganizationSettings::defaults(OrganizationId::random(), Utc::now());
        assert_eq!(settings.currency.as_ref(), "USD");
        assert_eq!(settings.low_stock_threshold, 5);
    }

    #[rstest]
    fn organization_names_are_validated() {
        assert!(Organization::create("   ", Utc::now()).is_err());
        let org = Organization::create(" Acme ", Utc::now()).expect("valid");
        assert_eq!(org.name, "Acme");
    }

    #[rstest]
    #[case(JoinRequestStatus::Pending)]
    #[case(JoinRequestStatus::Approved)]
    #[case(JoinRequestStatus::Rejected)]
    fn join_request_status_parses_storage_form(#[case] status: JoinRequestStatus) {
        assert_eq!(status.as_str().parse::<JoinRequestStatus>(), Ok(status));
    }
}
