//! PostgreSQL-backed `ClientRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{ClientRepository, ClientRepositoryError};
use crate::domain::{Client, ClientId, OrganizationId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_helpers::{TxError, collect_rows, contains_pattern, page_window};
use super::models::ClientRow;
use super::pool::{DbPool, PoolError};
use super::schema::{clients, orders};

/// Diesel-backed implementation of the `ClientRepository` port.
#[derive(Clone)]
pub struct DieselClientRepository {
    pool: DbPool,
}

impl DieselClientRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ClientRepositoryError {
    map_basic_pool_error(error, ClientRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ClientRepositoryError {
    if is_foreign_key_violation(&error) {
        return ClientRepositoryError::has_orders();
    }
    map_basic_diesel_error(
        error,
        ClientRepositoryError::query,
        ClientRepositoryError::connection,
    )
}

#[async_trait]
impl ClientRepository for DieselClientRepository {
    async fn list(
        &self,
        organization_id: &OrganizationId,
        search: Option<String>,
        page: &PageRequest,
    ) -> Result<Vec<Client>, ClientRepositoryError> {
        let (offset, limit) = page_window(page);
        let mut query = clients::table
            .filter(clients::organization_id.eq(*organization_id.as_uuid()))
            .into_boxed();
        if let Some(search) = search.as_deref() {
            query = query.filter(clients::name.ilike(contains_pattern(search)));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ClientRow> = query
            .order_by((clients::name.asc(), clients::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(ClientRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(ClientRow::into_domain),
            ClientRepositoryError::query,
        )
    }

    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &ClientId,
    ) -> Result<Option<Client>, ClientRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ClientRow> = clients::table
            .filter(clients::id.eq(id.as_uuid()))
            .filter(clients::organization_id.eq(organization_id.as_uuid()))
            .select(ClientRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(ClientRow::into_domain)
            .transpose()
            .map_err(ClientRepositoryError::query)
    }

    async fn insert(&self, client: &Client) -> Result<(), ClientRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(clients::table)
            .values(ClientRow::from(client))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(&self, client: &Client) -> Result<bool, ClientRepositoryError> {
        let row = ClientRow::from(client);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            clients::table
                .filter(clients::id.eq(row.id))
                .filter(clients::organization_id.eq(row.organization_id)),
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
        id: &ClientId,
    ) -> Result<bool, ClientRepositoryError> {
        let organization_id = *organization_id.as_uuid();
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, TxError<ClientRepositoryError>, _>(|conn| {
            async move {
                let has_orders: bool = diesel::select(diesel::dsl::exists(
                    orders::table.filter(orders::client_id.eq(id)),
                ))
                .get_result(conn)
                .await?;
                if has_orders {
                    return Err(TxError::Domain(ClientRepositoryError::has_orders()));
                }
                let deleted = diesel::delete(
                    clients::table
                        .filter(clients::id.eq(id))
                        .filter(clients::organization_id.eq(organization_id)),
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
        assert!(matches!(repo_err, ClientRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn closed_connections_map_to_connection_error() {
        struct Closed;
        impl diesel::result::DatabaseErrorInformation for Closed {
            fn message(&self) -> &str {
                "server closed the connection"
            }
            fn details(&self) -> Option<&str> {
                None
            }
            fn hint(&self) -> Option<&str> {
                None
            }
            fn table_name(&self) -> Option<&str> {
                None
            }
            fn column_name(&self) -> Option<&str> {
                None
            }
            fn constraint_name(&self) -> Option<&str> {
                None
            }
            fn statement_position(&self) -> Option<i32> {
                None
            }
        }
        let err = map_diesel_error(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ClosedConnection,
            Box::new(Closed),
        ));
        assert!(matches!(err, ClientRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn client_rows_keep_optional_contacts() {
        let row = ClientRow {
            id: uuid::Uuid::new_v4(),
            organization_id: uuid::Uuid::new_v4(),
            name: "Bob's Diner".into(),
            phone: None,
            email: Some("bob@example.com".into()),
            address: Some("1 Main St".into()),
        };
        let client = row.into_domain().expect("valid row");
        assert!(client.phone.is_none());
        assert_eq!(
            client.email.as_ref().map(AsRef::<str>::as_ref),
            Some("bob@example.com")
        );
    }
}
