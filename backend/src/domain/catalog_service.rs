//! Category and product management.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    CatalogRepository, CatalogRepositoryError, CatalogService, ProductRemoval,
};
use crate::domain::{
    Category, CategoryDraft, CategoryId, Error, ErrorCode, LowStockMonitor, Product,
    ProductDraft, ProductFilter, ProductId, TenantContext,
};

pub(crate) fn map_catalog_error(error: CatalogRepositoryError) -> Error {
    match error {
        CatalogRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("catalog repository unavailable: {message}"))
        }
        CatalogRepositoryError::Query { message } => {
            Error::internal(format!("catalog repository error: {message}"))
        }
        CatalogRepositoryError::DuplicateCategory => Error::new(
            ErrorCode::CategoryExists,
            "a category with this name already exists",
        ),
        CatalogRepositoryError::CategoryInUse => Error::new(
            ErrorCode::CategoryInUse,
            "category is still used by products",
        ),
        CatalogRepositoryError::InsufficientStock { product_id } => Error::new(
            ErrorCode::InsufficientStock,
            "stock cannot drop below zero",
        )
        .with_details(json!({ "productId": product_id })),
    }
}

fn category_not_found() -> Error {
    Error::new(ErrorCode::CategoryNotFound, "category not found")
}

pub(crate) fn product_not_found() -> Error {
    Error::new(ErrorCode::ProductNotFound, "product not found")
}

/// Catalog service implementing the driving port.
#[derive(Clone)]
pub struct CatalogServiceImpl<R> {
    repo: Arc<R>,
    low_stock: LowStockMonitor,
}

impl<R> CatalogServiceImpl<R> {
    /// Create a new service over `repo`.
    pub fn new(repo: Arc<R>, low_stock: LowStockMonitor) -> Self {
        Self { repo, low_stock }
    }
}

impl<R> CatalogServiceImpl<R>
where
    R: CatalogRepository,
{
    async fn ensure_category(
        &self,
        tenant: &TenantContext,
        category: Option<CategoryId>,
    ) -> Result<(), Error> {
        let Some(id) = category else {
            return Ok(());
        };
        self.repo
            .find_category(&tenant.organization_id, &id)
            .await
            .map_err(map_catalog_error)?
            .map(|_| ())
            .ok_or_else(|| {
                category_not_found().with_details(json!({ "field": "categoryId", "value": id }))
            })
    }
}

#[async_trait]
impl<R> CatalogService for CatalogServiceImpl<R>
where
    R: CatalogRepository,
{
    async fn list_categories(&self, tenant: &TenantContext) -> Result<Vec<Category>, Error> {
        self.repo
            .list_categories(&tenant.organization_id)
            .await
            .map_err(map_catalog_error)
    }

    async fn category(&self, tenant: &TenantContext, id: CategoryId) -> Result<Category, Error> {
        self.repo
            .find_category(&tenant.organization_id, &id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(category_not_found)
    }

    async fn create_category(
        &self,
        tenant: &TenantContext,
        draft: CategoryDraft,
    ) -> Result<Category, Error> {
        let category = draft.into_category(CategoryId::random(), tenant.organization_id);
        self.repo
            .insert_category(&category)
            .await
            .map_err(map_catalog_error)?;
        info!(category_id = %category.id, organization_id = %tenant.organization_id, "created category");
        Ok(category)
    }

    async fn update_category(
        &self,
        tenant: &TenantContext,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Category, Error> {
        let category = draft.into_category(id, tenant.organization_id);
        if self
            .repo
            .update_category(&category)
            .await
            .map_err(map_catalog_error)?
        {
            Ok(category)
        } else {
            Err(category_not_found())
        }
    }

    async fn delete_category(&self, tenant: &TenantContext, id: CategoryId) -> Result<(), Error> {
        if self
            .repo
            .delete_category(&tenant.organization_id, &id)
            .await
            .map_err(map_catalog_error)?
        {
            info!(category_id = %id, "deleted category");
            Ok(())
        } else {
            Err(category_not_found())
        }
    }

    async fn list_products(
        &self,
        tenant: &TenantContext,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, Error> {
        let rows = self
            .repo
            .list_products(&tenant.organization_id, &filter, &page)
            .await
            .map_err(map_catalog_error)?;
        Ok(Page::from_overfetch(rows, page))
    }

    async fn product(&self, tenant: &TenantContext, id: ProductId) -> Result<Product, Error> {
        self.repo
            .find_product(&tenant.organization_id, &id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(product_not_found)
    }

    async fn create_product(
        &self,
        tenant: &TenantContext,
        draft: ProductDraft,
    ) -> Result<Product, Error> {
        self.ensure_category(tenant, draft.category_id).await?;
        let product = draft.into_product(ProductId::random(), tenant.organization_id);
        self.repo
            .insert_product(&product)
            .await
            .map_err(map_catalog_error)?;
        info!(product_id = %product.id, organization_id = %tenant.organization_id, "created product");
        Ok(product)
    }

    async fn update_product(
        &self,
        tenant: &TenantContext,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product, Error> {
        self.ensure_category(tenant, draft.category_id).await?;
        let product = draft.into_product(id, tenant.organization_id);
        if !self
            .repo
            .update_product(&product)
            .await
            .map_err(map_catalog_error)?
        {
            return Err(product_not_found());
        }
        Ok(product)
    }

    async fn delete_product(
        &self,
        tenant: &TenantContext,
        id: ProductId,
    ) -> Result<ProductRemoval, Error> {
        let removal = self
            .repo
            .remove_product(&tenant.organization_id, &id)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(product_not_found)?;
        info!(product_id = %id, ?removal, "removed product");
        Ok(removal)
    }

    async fn adjust_stock(
        &self,
        tenant: &TenantContext,
        id: ProductId,
        delta: i64,
    ) -> Result<Product, Error> {
        let product = self
            .repo
            .adjust_stock(&tenant.organization_id, &id, delta)
            .await
            .map_err(map_catalog_error)?
            .ok_or_else(product_not_found)?;
        info!(product_id = %id, delta, stock = product.stock, "adjusted stock");
        if delta < 0 {
            self.low_stock
                .check(&tenant.organization_id, std::slice::from_ref(&product))
                .await;
        }
        Ok(product)
    }
}

#[cfg(test)]
mod tests;
