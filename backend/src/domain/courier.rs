//! Couriers (delivery drivers).

use serde::Serialize;
use utoipa::ToSchema;

use super::{CourierId, Error, OrganizationId, PHONE_MAX, optional_text, required_text};

/// Maximum length of a courier name.
pub const COURIER_NAME_MAX: usize = 120;

/// Maximum length of a vehicle description.
pub const VEHICLE_MAX: usize = 80;

/// Delivery driver employed by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Courier {
    #[schema(value_type = String, format = Uuid)]
    pub id: CourierId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    pub name: String,
    pub phone: Option<String>,
    pub vehicle: Option<String>,
    pub active: bool,
}

/// Validated courier fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourierDraft {
    pub name: String,
    pub phone: Option<String>,
    pub vehicle: Option<String>,
    pub active: bool,
}

impl CourierDraft {
    /// Validate raw courier fields.
    pub fn new(
        name: &str,
        phone: Option<&str>,
        vehicle: Option<&str>,
        active: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: required_text("name", name, COURIER_NAME_MAX)?,
            phone: optional_text("phone", phone, PHONE_MAX)?,
            vehicle: optional_text("vehicle", vehicle, VEHICLE_MAX)?,
            active,
        })
    }

    /// Materialise the draft under `id`.
    pub fn into_courier(self, id: CourierId, organization_id: OrganizationId) -> Courier {
        Courier {
            id,
            organization_id,
            name: self.name,
            phone: self.phone,
            vehicle: self.vehicle,
            active: self.active,
        }
    }
}
