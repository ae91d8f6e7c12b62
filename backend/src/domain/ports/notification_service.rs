//! Driving port for notifications.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{Error, Notification, NotificationFilter, NotificationId, TenantContext};

/// Reading and acknowledging organization notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn list(
        &self,
        tenant: &TenantContext,
        filter: NotificationFilter,
        page: PageRequest,
    ) -> Result<Page<Notification>, Error>;

    async fn mark_read(
        &self,
        tenant: &TenantContext,
        id: NotificationId,
    ) -> Result<Notification, Error>;

    /// Returns the number of notifications that changed.
    async fn mark_all_read(&self, tenant: &TenantContext) -> Result<u64, Error>;
}
