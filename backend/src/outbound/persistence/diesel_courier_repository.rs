//! PostgreSQL-backed `CourierRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{CourierRepository, CourierRepositoryError};
use crate::domain::{Courier, CourierId, OrderStatus, OrganizationId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_helpers::{TxError, page_window};
use super::models::CourierRow;
use super::pool::{DbPool, PoolError};
use super::schema::{couriers, order_assignments, orders};

/// Diesel-backed implementation of the `CourierRepository` port.
#[derive(Clone)]
pub struct DieselCourierRepository {
    pool: DbPool,
}

impl DieselCourierRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CourierRepositoryError {
    map_basic_pool_error(error, CourierRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CourierRepositoryError {
    map_basic_diesel_error(
        error,
        CourierRepositoryError::query,
        CourierRepositoryError::connection,
    )
}

fn terminal_statuses() -> [&'static str; 2] {
    [
        OrderStatus::Delivered.as_str(),
        OrderStatus::Cancelled.as_str(),
    ]
}

#[async_trait]
impl CourierRepository for DieselCourierRepository {
    async fn list(
        &self,
        organization_id: &OrganizationId,
        active: Option<bool>,
        page: &PageRequest,
    ) -> Result<Vec<Courier>, CourierRepositoryError> {
        let (offset, limit) = page_window(page);
        let mut query = couriers::table
            .filter(couriers::organization_id.eq(*organization_id.as_uuid()))
            .into_boxed();
        if let Some(active) = active {
            query = query.filter(couriers::active.eq(active));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CourierRow> = query
            .order_by((couriers::name.asc(), couriers::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(CourierRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Courier::from).collect())
    }

    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &CourierId,
    ) -> Result<Option<Courier>, CourierRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CourierRow> = couriers::table
            .filter(couriers::id.eq(id.as_uuid()))
            .filter(couriers::organization_id.eq(organization_id.as_uuid()))
            .select(CourierRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Courier::from))
    }

    async fn insert(&self, courier: &Courier) -> Result<(), CourierRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(couriers::table)
            .values(CourierRow::from(courier))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, courier: &Courier) -> Result<bool, CourierRepositoryError> {
        let row = CourierRow::from(courier);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            couriers::table
                .filter(couriers::id.eq(row.id))
                .filter(couriers::organization_id.eq(row.organization_id)),
        )
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &CourierId,
    ) -> Result<bool, CourierRepositoryError> {
        let organization_id = *organization_id.as_uuid();
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<CourierRepositoryError>, _>(|conn| {
            async move {
                let busy: bool = diesel::select(diesel::dsl::exists(
                    order_assignments::table
                        .inner_join(orders::table)
                        .filter(order_assignments::courier_id.eq(id))
                        .filter(orders::status.ne_all(terminal_statuses())),
                ))
                .get_result(conn)
                .await?;
                if busy {
                    return Err(TxError::Domain(CourierRepositoryError::busy()));
                }
                let deleted = diesel::delete(
                    couriers::table
                        .filter(couriers::id.eq(id))
                        .filter(couriers::organization_id.eq(organization_id)),
                )
                .execute(conn)
                .await?;
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.resolve(map_diesel_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("refused"));
        assert!(matches!(repo_err, CourierRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn busy_couriers_survive_the_transaction() {
        let err = TxError::Domain(CourierRepositoryError::busy()).resolve(map_diesel_error);
        assert_eq!(err, CourierRepositoryError::Busy);
    }

    #[rstest]
    fn terminal_statuses_cover_finished_orders() {
        assert_eq!(terminal_statuses(), ["delivered", "cancelled"]);
    }
}
