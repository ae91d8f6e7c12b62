//! Driving port for clients.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Client, ClientDraft, ClientId, Error, TenantContext};

/// Customer management within the caller's organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientService: Send + Sync {
    async fn list(
        &self,
        tenant: &TenantContext,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Client>, Error>;

    async fn get(&self, tenant: &TenantContext, id: ClientId) -> Result<Client, Error>;

    async fn create(&self, tenant: &TenantContext, draft: ClientDraft) -> Result<Client, Error>;

    async fn update(
        &self,
        tenant: &TenantContext,
        id: ClientId,
        draft: ClientDraft,
    ) -> Result<Client, Error>;

    /// Fails with `CLIENT_HAS_ORDERS` when orders reference the client.
    async fn delete(&self, tenant: &TenantContext, id: ClientId) -> Result<(), Error>;
}
