//! Port for category and product persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Category, CategoryId, OrganizationId, Product, ProductFilter, ProductId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalog repository adapters.
    pub enum CatalogRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "catalog repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "catalog repository query failed: {message}",
        /// Another category in the organization has the same name.
        DuplicateCategory => "category name already in use",
        /// The category is still referenced by products.
        CategoryInUse => "category is referenced by products",
        /// A stock adjustment would drive stock below zero.
        InsufficientStock { product_id: ProductId } =>
            "insufficient stock for product {product_id}",
    }
}

/// Outcome of removing a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductRemoval {
    /// The row was deleted.
    Deleted,
    /// Order details reference the product, so it was deactivated instead.
    Deactivated,
}

/// Storage for the product catalog. Every lookup is scoped to an
/// organization; rows of other tenants behave as missing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Categories of an organization ordered by name.
    async fn list_categories(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Category>, CatalogRepositoryError>;

    /// Fetch a category.
    async fn find_category(
        &self,
        organization_id: &OrganizationId,
        id: &CategoryId,
    ) -> Result<Option<Category>, CatalogRepositoryError>;

    /// Insert a category.
    async fn insert_category(&self, category: &Category) -> Result<(), CatalogRepositoryError>;

    /// Replace a category; `false` when it does not exist.
    async fn update_category(&self, category: &Category) -> Result<bool, CatalogRepositoryError>;

    /// Delete a category; `false` when it does not exist.
    async fn delete_category(
        &self,
        organization_id: &OrganizationId,
        id: &CategoryId,
    ) -> Result<bool, CatalogRepositoryError>;

    /// One page of products ordered by name; fetches `page.fetch_limit()`
    /// rows.
    async fn list_products(
        &self,
        organization_id: &OrganizationId,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<Vec<Product>, CatalogRepositoryError>;

    /// Fetch a product.
    async fn find_product(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Result<Option<Product>, CatalogRepositoryError>;

    /// Fetch every listed product that belongs to the organization.
    async fn find_products(
        &self,
        organization_id: &OrganizationId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, CatalogRepositoryError>;

    /// Insert a product.
    async fn insert_product(&self, product: &Product) -> Result<(), CatalogRepositoryError>;

    /// Replace a product; `false` when it does not exist.
    async fn update_product(&self, product: &Product) -> Result<bool, CatalogRepositoryError>;

    /// Delete or deactivate a product; `None` when it does not exist.
    async fn remove_product(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Result<Option<ProductRemoval>, CatalogRepositoryError>;

    /// Add `delta` to the stock, refusing to go below zero. Returns the
    /// updated product, or `None` when it does not exist.
    async fn adjust_stock(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
        delta: i64,
    ) -> Result<Option<Product>, CatalogRepositoryError>;
}
