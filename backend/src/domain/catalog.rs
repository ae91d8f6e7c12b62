//! Product catalog: categories and products.

use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use super::{CategoryId, Error, Money, OrganizationId, ProductId, optional_text, required_text};

/// Maximum length of category and product names.
pub const CATALOG_NAME_MAX: usize = 120;
/// Maximum length of catalog descriptions.
pub const CATALOG_DESCRIPTION_MAX: usize = 1000;

/// Product grouping within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[schema(value_type = String, format = Uuid)]
    pub id: CategoryId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
}

/// Validated input for creating or replacing a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryDraft {
    /// Validate raw category fields.
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, Error> {
        Ok(Self {
            name: required_text("name", name, CATALOG_NAME_MAX)?,
            description: optional_text("description", description, CATALOG_DESCRIPTION_MAX)?,
        })
    }

    /// Materialise the draft under `id`.
    pub fn into_category(self, id: CategoryId, organization_id: OrganizationId) -> Category {
        Category {
            id,
            organization_id,
            name: self.name,
            description: self.description,
        }
    }
}

/// Sellable item with a price and a stock level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[schema(value_type = String, format = Uuid)]
    pub id: ProductId,
    #[schema(value_type = String, format = Uuid)]
    pub organization_id: OrganizationId,
    #[schema(value_type = Option<String>, format = Uuid)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64, example = 12.5)]
    pub price: Money,
    pub stock: u32,
    pub active: bool,
}

impl Product {
    /// Whether `stock` is at or below `threshold`.
    pub fn is_low_on_stock(&self, threshold: u32) -> bool {
        self.stock <= threshold
    }
}

/// Validated input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub active: bool,
}

impl ProductDraft {
    /// Validate raw product fields. `stock` must fit a non-negative `u32`.
    pub fn new(
        category_id: Option<CategoryId>,
        name: &str,
        description: Option<&str>,
        price: Money,
        stock: i64,
        active: bool,
    ) -> Result<Self, Error> {
        let stock = u32::try_from(stock).map_err(|_| {
            Error::invalid_request("stock must be a non-negative integer").with_details(json!({
                "field": "stock",
                "code": "invalid_stock",
                "value": stock,
            }))
        })?;
        Ok(Self {
            category_id,
            name: required_text("name", name, CATALOG_NAME_MAX)?,
            description: optional_text("description", description, CATALOG_DESCRIPTION_MAX)?,
            price,
            stock,
            active,
        })
    }

    /// Materialise the draft under `id`.
    pub fn into_product(self, id: ProductId, organization_id: OrganizationId) -> Product {
        Product {
            id,
            organization_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            active: self.active,
        }
    }
}

/// Filters for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
}
