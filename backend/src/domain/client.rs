//! Customers who place orders.

use serde::Serialize;
use utoipa::ToSchema;

use super::{ClientId, Email, Error, OrganizationId, optional_text, required_text};

/// Maximum length of a client name.
pub const CLIENT_NAME_MAX: usize = 120;
/// Maximum length of a phone number.
pub const PHONE_MAX: usize = 40;
/// Maximum length of a postal address.
pub const ADDRESS_MAX: usize = 500;

/// Customer of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[schema(value_type = String, format = Uuid)]
    pub id: ClientId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    pub name: String,
    pub phone: Option<String>,
    #[schema(value_type = Option<String>)]
    pub email: Option<Email>,
    pub address: Option<String>,
}

/// Validated client fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<Email>,
    pub address: Option<String>,
}

impl ClientDraft {
    /// Validate raw client fields. The email is parsed by the caller.
    pub fn new(
        name: &str,
        phone: Option<&str>,
        email: Option<Email>,
        address: Option<&str>,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: required_text("name", name, CLIENT_NAME_MAX)?,
            phone: optional_text("phone", phone, PHONE_MAX)?,
            email,
            address: optional_text("address", address, ADDRESS_MAX)?,
        })
    }

    /// Materialise the draft under `id`.
    pub fn into_client(self, id: ClientId, organization_id: OrganizationId) -> Client {
        Client {
            id,
            organization_id,
            name: self.name,
            phone: self.phone,
            email: self.email,
            address: self.address,
        }
    }
}
