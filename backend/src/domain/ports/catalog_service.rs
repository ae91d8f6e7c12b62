//! Driving port for the product catalog.

use async_trait::async_trait;
use pagination::{Page, PageRequest};

use crate::domain::{
    Category, CategoryDraft, CategoryId, Error, Product, ProductDraft, ProductFilter, ProductId,
    TenantContext,
};

use super::ProductRemoval;

/// Category and product management within the caller's organization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_categories(&self, tenant: &TenantContext) -> Result<Vec<Category>, Error>;

    async fn category(&self, tenant: &TenantContext, id: CategoryId) -> Result<Category, Error>;

    async fn create_category(
        &self,
        tenant: &TenantContext,
        draft: CategoryDraft,
    ) -> Result<Category, Error>;

    async fn update_category(
        &self,
        tenant: &TenantContext,
        id: CategoryId,
        draft: CategoryDraft,
    ) -> Result<Category, Error>;

    /// Fails with `CATEGORY_IN_USE` while products reference the category.
    async fn delete_category(&self, tenant: &TenantContext, id: CategoryId) -> Result<(), Error>;

    async fn list_products(
        &self,
        tenant: &TenantContext,
        filter: ProductFilter,
        page: PageRequest,
    ) -> Result<Page<Product>, Error>;

    async fn product(&self, tenant: &TenantContext, id: ProductId) -> Result<Product, Error>;

    async fn create_product(
        &self,
        tenant: &TenantContext,
        draft: ProductDraft,
    ) -> Result<Product, Error>;

    async fn update_product(
        &self,
        tenant: &TenantContext,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product, Error>;

    /// Products referenced by orders are deactivated rather than deleted.
    async fn delete_product(
        &self,
        tenant: &TenantContext,
        id: ProductId,
    ) -> Result<ProductRemoval, Error>;

    /// Apply a relative stock change; the result must stay non-negative.
    async fn adjust_stock(
        &self,
        tenant: &TenantContext,
        id: ProductId,
        delta: i64,
    ) -> Result<Product, Error>;
}
