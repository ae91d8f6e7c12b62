//! Port for client persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Client, ClientId, OrganizationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by client repository adapters.
    pub enum ClientRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "client repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "client repository query failed: {message}",
        /// The client has orders and cannot be deleted.
        HasOrders => "client has orders",
    }
}

/// Storage for customers, scoped per organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// One page of clients ordered by name, optionally filtered by a
    /// case-insensitive name fragment.
    async fn list(
        &self,
        organization_id: &OrganizationId,
        search: Option<String>,
        page: &PageRequest,
    ) -> Result<Vec<Client>, ClientRepositoryError>;

    /// Fetch a client.
    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &ClientId,
    ) -> Result<Option<Client>, ClientRepositoryError>;

    /// Insert a client.
    async fn insert(&self, client: &Client) -> Result<(), ClientRepositoryError>;

    /// Replace a client; `false` when it does not exist.
    async fn update(&self, client: &Client) -> Result<bool, ClientRepositoryError>;

    /// Delete a client; `false` when it does not exist.
    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &ClientId,
    ) -> Result<bool, ClientRepositoryError>;
}
