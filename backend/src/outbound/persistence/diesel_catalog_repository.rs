//! PostgreSQL-backed `CatalogRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{CatalogRepository, CatalogRepositoryError, ProductRemoval};
use crate::domain::{Category, CategoryId, OrganizationId, Product, ProductFilter, ProductId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_helpers::{TxError, collect_rows, contains_pattern, page_window};
use super::models::{CategoryRow, ProductRow};
use super::pool::{DbPool, PoolError};
use super::schema::{categories, order_details, products};

const CATEGORY_NAME_CONSTRAINT: &str = "categories_organization_name_key";

type Tx = TxError<CatalogRepositoryError>;

/// Diesel-backed implementation of the `CatalogRepository` port.
#[derive(Clone)]
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogRepositoryError {
    map_basic_pool_error(error, CatalogRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CatalogRepositoryError {
    if is_unique_violation(&error, Some(CATEGORY_NAME_CONSTRAINT)) {
        return CatalogRepositoryError::duplicate_category();
    }
    map_basic_diesel_error(
        error,
        CatalogRepositoryError::query,
        CatalogRepositoryError::connection,
    )
}

fn map_category_delete_error(error: diesel::result::Error) -> CatalogRepositoryError {
    if is_foreign_key_violation(&error) {
        return CatalogRepositoryError::category_in_use();
    }
    map_diesel_error(error)
}

fn map_tx_error(error: Tx) -> CatalogRepositoryError {
    error.resolve(map_diesel_error)
}

fn row_to_product(row: ProductRow) -> Result<Product, CatalogRepositoryError> {
    row.into_domain().map_err(CatalogRepositoryError::query)
}

fn product_row(product: &Product) -> Result<ProductRow, CatalogRepositoryError> {
    ProductRow::from_domain(product).map_err(CatalogRepositoryError::query)
}

#[async_trait]
impl CatalogRepository for DieselCatalogRepository {
    async fn list_categories(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Category>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CategoryRow> = categories::table
            .filter(categories::organization_id.eq(organization_id.as_uuid()))
            .order_by((categories::name.asc(), categories::id.asc()))
            .select(CategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category(
        &self,
        organization_id: &OrganizationId,
        id: &CategoryId,
    ) -> Result<Option<Category>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CategoryRow> = categories::table
            .filter(categories::id.eq(id.as_uuid()))
            .filter(categories::organization_id.eq(organization_id.as_uuid()))
            .select(CategoryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Category::from))
    }

    async fn insert_category(&self, category: &Category) -> Result<(), CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(categories::table)
            .values(CategoryRow::from(category))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_category(&self, category: &Category) -> Result<bool, CatalogRepositoryError> {
        let row = CategoryRow::from(category);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            categories::table
                .filter(categories::id.eq(row.id))
                .filter(categories::organization_id.eq(row.organization_id)),
        )
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn delete_category(
        &self,
        organization_id: &OrganizationId,
        id: &CategoryId,
    ) -> Result<bool, CatalogRepositoryError> {
        let organization_id = *organization_id.as_uuid();
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, Tx, _>(|conn| {
            async move {
                let referenced: i64 = products::table
                    .filter(products::category_id.eq(id))
                    .count()
                    .get_result(conn)
                    .await?;
                if referenced > 0 {
                    return Err(TxError::Domain(CatalogRepositoryError::category_in_use()));
                }
                let deleted = diesel::delete(
                    categories::table
                        .filter(categories::id.eq(id))
                        .filter(categories::organization_id.eq(organization_id)),
                )
                .execute(conn)
                .await?;
                Ok(deleted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.resolve(map_category_delete_error))
    }

    async fn list_products(
        &self,
        organization_id: &OrganizationId,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<Vec<Product>, CatalogRepositoryError> {
        let (offset, limit) = page_window(page);
        let mut query = products::table
            .filter(products::organization_id.eq(*organization_id.as_uuid()))
            .into_boxed();
        if let Some(category_id) = filter.category_id {
            query = query.filter(products::category_id.eq(*category_id.as_uuid()));
        }
        if let Some(search) = filter.search.as_deref() {
            query = query.filter(products::name.ilike(contains_pattern(search)));
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProductRow> = query
            .order_by((products::name.asc(), products::id.asc()))
            .offset(offset)
            .limit(limit)
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(ProductRow::into_domain),
            CatalogRepositoryError::query,
        )
    }

    async fn find_product(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Result<Option<Product>, CatalogRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        products::table
            .filter(products::id.eq(id.as_uuid()))
            .filter(products::organization_id.eq(organization_id.as_uuid()))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_product)
            .transpose()
    }

    async fn find_products(
        &self,
        organization_id: &OrganizationId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, CatalogRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ProductRow> = products::table
            .filter(products::organization_id.eq(organization_id.as_uuid()))
            .filter(products::id.eq_any(ids))
            .select(ProductRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(ProductRow::into_domain),
            CatalogRepositoryError::query,
        )
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogRepositoryError> {
        let row = product_row(product)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(products::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update_product(&self, product: &Product) -> Result<bool, CatalogRepositoryError> {
        let row = product_row(product)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(
            products::table
                .filter(products::id.eq(row.id))
                .filter(products::organization_id.eq(row.organization_id)),
        )
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(updated > 0)
    }

    async fn remove_product(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Result<Option<ProductRemoval>, CatalogRepositoryError> {
        let organization_id = *organization_id.as_uuid();
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, Tx, _>(|conn| {
            async move {
                let target = || {
                    products::table
                        .filter(products::id.eq(id))
                        .filter(products::organization_id.eq(organization_id))
                };
                let exists: bool = diesel::select(diesel::dsl::exists(target()))
                    .get_result(conn)
                    .await?;
                if !exists {
                    return Ok(None);
                }
                let referenced: bool = diesel::select(diesel::dsl::exists(
                    order_details::table.filter(order_details::product_id.eq(id)),
                ))
                .get_result(conn)
                .await?;
                if referenced {
                    diesel::update(target())
                        .set(products::active.eq(false))
                        .execute(conn)
                        .await?;
                    return Ok(Some(ProductRemoval::Deactivated));
                }
                diesel::delete(target()).execute(conn).await?;
                Ok(Some(ProductRemoval::Deleted))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn adjust_stock(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
        delta: i64,
    ) -> Result<Option<Product>, CatalogRepositoryError> {
        let delta = i32::try_from(delta)
            .map_err(|_| CatalogRepositoryError::query("stock adjustment out of range"))?;
        let product_id = *id;
        let organization_id = *organization_id.as_uuid();
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction::<_, Tx, _>(|conn| {
                async move {
                    let target = || {
                        products::table
                            .filter(products::id.eq(id))
                            .filter(products::organization_id.eq(organization_id))
                    };
                    let updated: Option<ProductRow> = diesel::update(
                        target().filter(products::stock.ge(delta.saturating_neg().max(0))),
                    )
                    .set(products::stock.eq(products::stock + delta))
                    .returning(ProductRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    if updated.is_some() {
                        return Ok(updated);
                    }
                    let exists: bool = diesel::select(diesel::dsl::exists(target()))
                        .get_result(conn)
                        .await?;
                    if exists {
                        return Err(TxError::Domain(CatalogRepositoryError::insufficient_stock(
                            product_id,
                        )));
                    }
                    Ok(None)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;
        row.map(row_to_product).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("timed out"));
        assert!(matches!(repo_err, CatalogRepositoryError::Connection { .. }));
    }

    #[rstest]
    fn stock_guard_failures_keep_the_product() {
        let product_id = ProductId::random();
        let err = map_tx_error(TxError::Domain(
            CatalogRepositoryError::insufficient_stock(product_id),
        ));
        assert_eq!(err, CatalogRepositoryError::InsufficientStock { product_id });
    }

    #[rstest]
    fn corrupt_rows_map_to_query_errors() {
        let row = ProductRow {
            id: uuid::Uuid::new_v4(),
            organization_id: uuid::Uuid::new_v4(),
            category_id: None,
            name: "Cola".into(),
            description: None,
            price_cents: 100,
            stock: -3,
            active: true,
        };
        assert!(matches!(
            row_to_product(row),
            Err(CatalogRepositoryError::Query { .. })
        ));
    }
}
