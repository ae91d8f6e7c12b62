//! Client management service.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::info;

use crate::domain::ports::{ClientRepository, ClientRepositoryError, ClientService};
use crate::domain::{Client, ClientDraft, ClientId, Error, ErrorCode, TenantContext};

pub(crate) fn map_client_error(error: ClientRepositoryError) -> Error {
    match error {
        ClientRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("client repository unavailable: {message}"))
        }
        ClientRepositoryError::Query { message } => {
            Error::internal(format!("client repository error: {message}"))
        }
        ClientRepositoryError::HasOrders => Error::new(
            ErrorCode::ClientHasOrders,
            "client has orders and cannot be deleted",
        ),
    }
}

pub(crate) fn client_not_found() -> Error {
    Error::new(ErrorCode::ClientNotFound, "client not found")
}

/// Client service implementing the driving port.
#[derive(Clone)]
pub struct ClientServiceImpl<R> {
    repo: Arc<R>,
}

impl<R> ClientServiceImpl<R> {
    /// Create a new service over `repo`.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> ClientService for ClientServiceImpl<R>
where
    R: ClientRepository,
{
    async fn list(
        &self,
        tenant: &TenantContext,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Client>, Error> {
        let search = search
            .map(|term| term.trim().to_owned())
            .filter(|term| !term.is_empty());
        let rows = self
            .repo
            .list(&tenant.organization_id, search, &page)
            .await
            .map_err(map_client_error)?;
        Ok(Page::from_overfetch(rows, page))
    }

    async fn get(&self, tenant: &TenantContext, id: ClientId) -> Result<Client, Error> {
        self.repo
            .find(&tenant.organization_id, &id)
            .await
            .map_err(map_client_error)?
            .ok_or_else(client_not_found)
    }

    async fn create(&self, tenant: &TenantContext, draft: ClientDraft) -> Result<Client, Error> {
        let client = draft.into_client(ClientId::random(), tenant.organization_id);
        self.repo.insert(&client).await.map_err(map_client_error)?;
        info!(client_id = %client.id, organization_id = %tenant.organization_id, "created client");
        Ok(client)
    }

    async fn update(
        &self,
        tenant: &TenantContext,
        id: ClientId,
        draft: ClientDraft,
    ) -> Result<Client, Error> {
        let client = draft.into_client(id, tenant.organization_id);
        if self.repo.update(&client).await.map_err(map_client_error)? {
            Ok(client)
        } else {
            Err(client_not_found())
        }
    }

    async fn delete(&self, tenant: &TenantContext, id: ClientId) -> Result<(), Error> {
        if self
            .repo
            .delete(&tenant.organization_id, &id)
            .await
            .map_err(map_client_error)?
        {
            info!(client_id = %id, "deleted client");
            Ok(())
        } else {
            Err(client_not_found())
        }
    }
}
