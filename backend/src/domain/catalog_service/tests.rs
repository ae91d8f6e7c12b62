//! Tests for the catalog service.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockCatalogRepository, MockNotificationRepository, MockOrganizationRepository,
};
use crate::domain::{Money, NotificationKind, NotificationPublisher, OrganizationId, Role, UserId};

#[fixture]
fn tenant() -> TenantContext {
    TenantContext {
        user_id: UserId::random(),
        organization_id: OrganizationId::random(),
        role: Role::Member,
    }
}

fn monitor(
    organizations: MockOrganizationRepository,
    notifications: MockNotificationRepository,
) -> LowStockMonitor {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    LowStockMonitor::new(
        Arc::new(organizations),
        NotificationPublisher::new(Arc::new(notifications), clock),
    )
}

fn quiet_monitor() -> LowStockMonitor {
    monitor(MockOrganizationRepository::new(), MockNotificationRepository::new())
}

fn service(repo: MockCatalogRepository, low_stock: LowStockMonitor) -> CatalogServiceImpl<MockCatalogRepository> {
    CatalogServiceImpl::new(Arc::new(repo), low_stock)
}

fn product(tenant: &TenantContext, stock: i64) -> Product {
    ProductDraft::new(None, "Cola", None, Money::from_cents(150).expect("price"), stock, true)
        .expect("valid")
        .into_product(ProductId::random(), tenant.organization_id)
}

#[rstest]
#[tokio::test]
async fn duplicate_category_names_conflict(tenant: TenantContext) {
    let mut repo = MockCatalogRepository::new();
    repo.expect_insert_category()
        .return_once(|_| Err(CatalogRepositoryError::duplicate_category()));

    let err = service(repo, quiet_monitor())
        .create_category(&tenant, CategoryDraft::new("Drinks", None).expect("valid"))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::CategoryExists);
}

#[rstest]
#[tokio::test]
async fn categories_in_use_cannot_be_deleted(tenant: TenantContext) {
    let mut repo = MockCatalogRepository::new();
    repo.expect_delete_category()
        .return_once(|_, _| Err(CatalogRepositoryError::category_in_use()));

    let err = service(repo, quiet_monitor())
        .delete_category(&tenant, CategoryId::random())
        .await
        .expect_err("in use");
    assert_eq!(err.code(), ErrorCode::CategoryInUse);
}

#[rstest]
#[tokio::test]
async fn products_cannot_reference_foreign_categories(tenant: TenantContext) {
    let mut repo = MockCatalogRepository::new();
    repo.expect_find_category().return_once(|_, _| Ok(None));
    repo.expect_insert_product().never();

    let draft = ProductDraft::new(
        Some(CategoryId::random()),
        "Cola",
        None,
        Money::from_cents(150).expect("price"),
        3,
        true,
    )
    .expect("valid");
    let err = service(repo, quiet_monitor())
        .create_product(&tenant, draft)
        .await
        .expect_err("foreign category");
    assert_eq!(err.code(), ErrorCode::CategoryNotFound);
}

#[rstest]
#[tokio::test]
async fn referenced_products_are_deactivated(tenant: TenantContext) {
    let mut repo = MockCatalogRepository::new();
    repo.expect_remove_product()
        .return_once(|_, _| Ok(Some(ProductRemoval::Deactivated)));

    let removal = service(repo, quiet_monitor())
        .delete_product(&tenant, ProductId::random())
        .await
        .expect("removed");
    assert_eq!(removal, ProductRemoval::Deactivated);
}

#[rstest]
#[tokio::test]
async fn adjust_stock_refuses_negative_results(tenant: TenantContext) {
    let id = ProductId::random();
    let mut repo = MockCatalogRepository::new();
    repo.expect_adjust_stock()
        .return_once(move |_, _, _| Err(CatalogRepositoryError::insufficient_stock(id)));

    let err = service(repo, quiet_monitor())
        .adjust_stock(&tenant, id, -50)
        .await
        .expect_err("negative");
    assert_eq!(err.code(), ErrorCode::InsufficientStock);
}

#[rstest]
#[tokio::test]
async fn draining_stock_emits_low_stock(tenant: TenantContext) {
    let drained = product(&tenant, 2);
    let id = drained.id;
    let mut repo = MockCatalogRepository::new();
    repo.expect_adjust_stock()
        .withf(move |_, product, delta| *product == id && *delta == -8)
        .return_once(move |_, _, _| Ok(Some(drained)));
    let mut organizations = MockOrganizationRepository::new();
    organizations.expect_settings().return_once(|_| Ok(None));
    let mut notifications = MockNotificationRepository::new();
    notifications
        .expect_insert()
        .withf(move |n| n.kind == NotificationKind::LowStock && n.product_id == Some(id))
        .times(1)
        .return_once(|_| Ok(()));

    let adjusted = service(repo, monitor(organizations, notifications))
        .adjust_stock(&tenant, id, -8)
        .await
        .expect("adjusted");
    assert_eq!(adjusted.stock, 2);
}

#[rstest]
#[tokio::test]
async fn restocking_does_not_notify(tenant: TenantContext) {
    let restocked = product(&tenant, 3);
    let mut repo = MockCatalogRepository::new();
    repo.expect_adjust_stock()
        .return_once(move |_, _, _| Ok(Some(restocked)));

    service(repo, quiet_monitor())
        .adjust_stock(&tenant, ProductId::random(), 1)
        .await
        .expect("adjusted");
}
