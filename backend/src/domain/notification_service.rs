//! Notification recording and the notification driving port.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Page, PageRequest};
use tracing::warn;

use crate::domain::ports::{
    NotificationRepository, NotificationRepositoryError, NotificationService,
    OrganizationRepository,
};
use crate::domain::{
    DEFAULT_LOW_STOCK_THRESHOLD, Error, ErrorCode, NewNotification, Notification,
    NotificationFilter, NotificationId, OrganizationId, Product, TenantContext,
};

pub(crate) fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => Error::service_unavailable(
            format!("notification repository unavailable: {message}"),
        ),
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Records notifications on behalf of other services.
///
/// Recording is best effort: a failure is logged and swallowed so the
/// operation that triggered the notification still succeeds.
#[derive(Clone)]
pub struct NotificationPublisher {
    repo: Arc<dyn NotificationRepository>,
    clock: Arc<dyn Clock>,
}

impl NotificationPublisher {
    /// Create a publisher writing to `repo`.
    pub fn new(repo: Arc<dyn NotificationRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Record `notification`, logging instead of failing.
    pub async fn publish(&self, notification: NewNotification) {
        let kind = notification.kind;
        let stored = notification.into_notification(NotificationId::random(), self.clock.utc());
        if let Err(error) = self.repo.insert(&stored).await {
            warn!(
                %error,
                kind = kind.as_str(),
                organization_id = %stored.organization_id,
                "failed to record notification"
            );
        }
    }
}

/// Emits `low_stock` notifications for products at or below the
/// organization's threshold.
#[derive(Clone)]
pub struct LowStockMonitor {
    organizations: Arc<dyn OrganizationRepository>,
    publisher: NotificationPublisher,
}

impl LowStockMonitor {
    /// Create a monitor reading thresholds from `organizations`.
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        publisher: NotificationPublisher,
    ) -> Self {
        Self {
            organizations,
            publisher,
        }
    }

    async fn threshold(&self, organization_id: &OrganizationId) -> u32 {
        match self.organizations.settings(organization_id).await {
            Ok(settings) => settings.map_or(DEFAULT_LOW_STOCK_THRESHOLD, |s| s.low_stock_threshold),
            Err(error) => {
                warn!(%error, %organization_id, "falling back to default low stock threshold");
                DEFAULT_LOW_STOCK_THRESHOLD
            }
        }
    }

    /// Notify about every product in `products` that is low on stock.
    pub async fn check(&self, organization_id: &OrganizationId, products: &[Product]) {
        if products.is_empty() {
            return;
        }
        let threshold = self.threshold(organization_id).await;
        for product in products.iter().filter(|p| p.is_low_on_stock(threshold)) {
            self.publisher
                .publish(NewNotification::low_stock(product))
                .await;
        }
    }
}

/// Notification service implementing the driving port.
#[derive(Clone)]
pub struct NotificationServiceImpl<R> {
    repo: Arc<R>,
}

impl<R> NotificationServiceImpl<R> {
    /// Create a new service over `repo`.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> NotificationService for NotificationServiceImpl<R>
where
    R: NotificationRepository,
{
    async fn list(
        &self,
        tenant: &TenantContext,
        filter: NotificationFilter,
        page: PageRequest,
    ) -> Result<Page<Notification>, Error> {
        let rows = self
            .repo
            .list(&tenant.organization_id, filter, &page)
            .await
            .map_err(map_notification_error)?;
        Ok(Page::from_overfetch(rows, page))
    }

    async fn mark_read(
        &self,
        tenant: &TenantContext,
        id: NotificationId,
    ) -> Result<Notification, Error> {
        self.repo
            .mark_read(&tenant.organization_id, &id)
            .await
            .map_err(map_notification_error)?
            .ok_or_else(|| Error::new(ErrorCode::NotificationNotFound, "notification not found"))
    }

    async fn mark_all_read(&self, tenant: &TenantContext) -> Result<u64, Error> {
        self.repo
            .mark_all_read(&tenant.organization_id)
            .await
            .map_err(map_notification_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockNotificationRepository, MockOrganizationRepository};
    use crate::domain::{
        Money, NotificationKind, OrganizationSettings, ProductDraft, ProductId, Role, UserId,
    };
    use chrono::Utc;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tenant() -> TenantContext {
        TenantContext {
            user_id: UserId::random(),
            organization_id: OrganizationId::random(),
            role: Role::Member,
        }
    }

    fn sample(organization_id: OrganizationId) -> NewNotification {
        NewNotification {
            organization_id,
            kind: NotificationKind::LowStock,
            title: "Low stock".into(),
            message: "Cola has 2 units left".into(),
            order_id: None,
            product_id: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn publish_swallows_repository_failures(tenant: TenantContext) {
        let mut repo = MockNotificationRepository::new();
        repo.expect_insert()
            .times(1)
            .return_once(|_| Err(NotificationRepositoryError::query("disk full")));
        let publisher = NotificationPublisher::new(Arc::new(repo), Arc::new(DefaultClock));

        publisher.publish(sample(tenant.organization_id)).await;
    }

    #[rstest]
    #[tokio::test]
    async fn publish_stores_unread_notifications(tenant: TenantContext) {
        let mut repo = MockNotificationRepository::new();
        repo.expect_insert()
            .withf(|stored| !stored.read && stored.kind == NotificationKind::LowStock)
            .times(1)
            .return_once(|_| Ok(()));
        let publisher = NotificationPublisher::new(Arc::new(repo), Arc::new(DefaultClock));

        publisher.publish(sample(tenant.organization_id)).await;
    }

    #[rstest]
    #[tokio::test]
    async fn mark_read_reports_missing_notifications(tenant: TenantContext) {
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read().return_once(|_, _| Ok(None));
        let service = NotificationServiceImpl::new(Arc::new(repo));

        let err = service
            .mark_read(&tenant, NotificationId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotificationNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failures_are_service_unavailable(tenant: TenantContext) {
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_all_read()
            .return_once(|_| Err(NotificationRepositoryError::connection("refused")));
        let service = NotificationServiceImpl::new(Arc::new(repo));

        let err = service.mark_all_read(&tenant).await.expect_err("down");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    fn product(organization_id: OrganizationId, name: &str, stock: i64) -> Product {
        ProductDraft::new(None, name, None, Money::ZERO, stock, true)
            .expect("valid product")
            .into_product(ProductId::random(), organization_id)
    }

    #[rstest]
    #[tokio::test]
    async fn low_stock_monitor_uses_the_configured_threshold(tenant: TenantContext) {
        let org = tenant.organization_id;
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_settings().times(1).return_once(move |_| {
            let mut settings = OrganizationSettings::defaults(org, Utc::now());
            settings.low_stock_threshold = 10;
            Ok(Some(settings))
        });
        let mut repo = MockNotificationRepository::new();
        repo.expect_insert()
            .withf(|stored| stored.kind == NotificationKind::LowStock)
            .times(1)
            .return_once(|_| Ok(()));
        let monitor = LowStockMonitor::new(
            Arc::new(organizations),
            NotificationPublisher::new(Arc::new(repo), Arc::new(DefaultClock)),
        );

        monitor
            .check(&org, &[product(org, "Cola", 10), product(org, "Water", 11)])
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn low_stock_monitor_skips_lookup_without_products(tenant: TenantContext) {
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_settings().never();
        let monitor = LowStockMonitor::new(
            Arc::new(organizations),
            NotificationPublisher::new(
                Arc::new(MockNotificationRepository::new()),
                Arc::new(DefaultClock),
            ),
        );

        monitor.check(&tenant.organization_id, &[]).await;
    }
}
