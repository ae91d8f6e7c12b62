//! Driving port for couriers.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Courier, CourierDraft, CourierId, Error, TenantContext};

/// Courier management within the caller's organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourierService: Send + Sync {
    async fn list(
        &self,
        tenant: &TenantContext,
        active: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<Courier>, Error>;

    async fn get(&self, tenant: &TenantContext, id: CourierId) -> Result<Courier, Error>;

    async fn create(&self, tenant: &TenantContext, draft: CourierDraft)
    -> Result<Courier, Error>;

    async fn update(
        &self,
        tenant: &TenantContext,
        id: CourierId,
        draft: CourierDraft,
    ) -> Result<Courier, Error>;

    /// Fails with `COURIER_BUSY` while the courier has an order in progress.
    async fn delete(&self, tenant: &TenantContext, id: CourierId) -> Result<(), Error>;
}
