//! Courier management service.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tracing::info;

use crate::domain::ports::{CourierRepository, CourierRepositoryError, CourierService};
use crate::domain::{Courier, CourierDraft, CourierId, Error, ErrorCode, TenantContext};

pub(crate) fn map_courier_error(error: CourierRepositoryError) -> Error {
    match error {
        CourierRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("courier repository unavailable: {message}"))
        }
        CourierRepositoryError::Query { message } => {
            Error::internal(format!("courier repository error: {message}"))
        }
        CourierRepositoryError::Busy => Error::new(
            ErrorCode::CourierBusy,
            "courier has active deliveries and cannot be removed",
        ),
    }
}

pub(crate) fn courier_not_found() -> Error {
    Error::new(ErrorCode::CourierNotFound, "courier not found")
}

/// Courier service implementing the driving port.
#[derive(Clone)]
pub struct CourierServiceImpl<R> {
    repo: Arc<R>,
}

impl<R> CourierServiceImpl<R> {
    /// Create a new service over `repo`.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl<R> CourierService for CourierServiceImpl<R>
where
    R: CourierRepository,
{
    async fn list(
        &self,
        tenant: &TenantContext,
        active: Option<bool>,
        page: PageRequest,
    ) -> Result<Page<Courier>, Error> {
        let rows = self
            .repo
            .list(&tenant.organization_id, active, &page)
            .await
            .map_err(map_courier_error)?;
        Ok(Page::from_overfetch(rows, page))
    }

    async fn get(&self, tenant: &TenantContext, id: CourierId) -> Result<Courier, Error> {
        self.repo
            .find(&tenant.organization_id, &id)
            .await
            .map_err(map_courier_error)?
            .ok_or_else(courier_not_found)
    }

    async fn create(
        &self,
        tenant: &TenantContext,
        draft: CourierDraft,
    ) -> Result<Courier, Error> {
        let courier = draft.into_courier(CourierId::random(), tenant.organization_id);
        self.repo.insert(&courier).await.map_err(map_courier_error)?;
        info!(courier_id = %courier.id, organization_id = %tenant.organization_id, "created courier");
        Ok(courier)
    }

    async fn update(
        &self,
        tenant: &TenantContext,
        id: CourierId,
        draft: CourierDraft,
    ) -> Result<Courier, Error> {
        let courier = draft.into_courier(id, tenant.organization_id);
        if self.repo.update(&courier).await.map_err(map_courier_error)? {
            Ok(courier)
        } else {
            Err(courier_not_found())
        }
    }

    async fn delete(&self, tenant: &TenantContext, id: CourierId) -> Result<(), Error> {
        let deleted = self
            .repo
            .delete(&tenant.organization_id, &id)
            .await
            .map_err(map_courier_error)?;
        if !deleted {
            return Err(courier_not_found());
        }
        info!(courier_id = %id, "deleted courier");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockCourierRepository;
    use crate::domain::{OrganizationId, Role, UserId};
    use rstest::{fixture, rstest};

    #[fixture]
    fn tenant() -> TenantContext {
        TenantContext {
            user_id: UserId::random(),
            organization_id: OrganizationId::random(),
            role: Role::Member,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn list_passes_the_active_filter(tenant: TenantContext) {
        let mut repo = MockCourierRepository::new();
        repo.expect_list()
            .withf(|_, active, page| *active == Some(true) && page.limit() == 2)
            .times(1)
            .return_once(move |org, _, _| {
                let courier = |name: &str| {
                    CourierDraft::new(name, None, Some("bike"), true)
                        .expect("valid")
                        .into_courier(CourierId::random(), *org)
                };
                Ok(vec![courier("a"), courier("b"), courier("c")])
            });

        let page = CourierServiceImpl::new(Arc::new(repo))
            .list(&tenant, Some(true), PageRequest::first(2))
            .await
            .expect("listed");
        assert_eq!(page.items().len(), 2);
        assert!(page.next_cursor().is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn get_reports_missing_couriers(tenant: TenantContext) {
        let mut repo = MockCourierRepository::new();
        repo.expect_find().return_once(|_, _| Ok(None));

        let err = CourierServiceImpl::new(Arc::new(repo))
            .get(&tenant, CourierId::random())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::CourierNotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn busy_couriers_cannot_be_deleted(tenant: TenantContext) {
        let mut repo = MockCourierRepository::new();
        repo.expect_delete()
            .return_once(|_, _| Err(CourierRepositoryError::busy()));

        let err = CourierServiceImpl::new(Arc::new(repo))
            .delete(&tenant, CourierId::random())
            .await
            .expect_err("busy");
        assert_eq!(err.code(), ErrorCode::CourierBusy);
    }
}
