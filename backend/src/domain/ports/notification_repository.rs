//! Port for notification persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Notification, NotificationFilter, NotificationId, OrganizationId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "notification repository query failed: {message}",
    }
}

/// Storage for organization notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Record a notification.
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError>;

    /// One page of notifications, newest first.
    async fn list(
        &self,
        organization_id: &OrganizationId,
        filter: NotificationFilter,
        page: &PageRequest,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark one notification read; `None` when it does not exist.
    async fn mark_read(
        &self,
        organization_id: &OrganizationId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// Mark every unread notification read and return how many changed.
    async fn mark_all_read(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<u64, NotificationRepositoryError>;
}
