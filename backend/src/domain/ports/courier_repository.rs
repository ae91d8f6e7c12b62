//! Port for courier persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Courier, CourierId, OrganizationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by courier repository adapters.
    pub enum CourierRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "courier repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "courier repository query failed: {message}",
        /// The courier is assigned to an order still in progress.
        Busy => "courier has open assignments",
    }
}

/// Storage for couriers, scoped per organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourierRepository: Send + Sync {
    /// One page of couriers ordered by name, optionally only active or only
    /// inactive ones.
    async fn list(
        &self,
        organization_id: &OrganizationId,
        active: Option<bool>,
        page: &PageRequest,
    ) -> Result<Vec<Courier>, CourierRepositoryError>;

    /// Fetch a courier.
    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &CourierId,
    ) -> Result<Option<Courier>, CourierRepositoryError>;

    /// Insert a courier.
    async fn insert(&self, courier: &Courier) -> Result<(), CourierRepositoryError>;

    /// Replace a courier; `false` when it does not exist.
    async fn update(&self, courier: &Courier) -> Result<bool, CourierRepositoryError>;

    /// Delete a courier and the assignments of finished orders; `false` when
    /// it does not exist.
    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &CourierId,
    ) -> Result<bool, CourierRepositoryError>;
}
