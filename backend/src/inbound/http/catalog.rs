//! Categories, products and stock adjustments.
//!
//! ```text
//! GET    /api/v1/categories
//! POST   /api/v1/categories
//! GET    /api/v1/categories/{id}
//! PUT    /api/v1/categories/{id}
//! DELETE /api/v1/categories/{id}
//! GET    /api/v1/products?categoryId&search&cursor&limit
//! POST   /api/v1/products
//! GET    /api/v1/products/{id}
//! PUT    /api/v1/products/{id}
//! DELETE /api/v1/products/{id}
//! PATCH  /api/v1/products/{id}/stock
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::ProductRemoval;
use crate::domain::{
    Category, CategoryDraft, CategoryId, Error, Product, ProductDraft, ProductFilter, ProductId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::Tenant;
use crate::inbound::http::envelope::{Deleted, Envelope, ErrorEnvelope, created, ok, paged};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, page_request, parse_amount, parse_id, parse_optional_id, require,
};

/// Category fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    #[schema(example = "Beverages")]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Product fields. `stock` defaults to 0 and `active` to true.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[schema(format = Uuid)]
    pub category_id: Option<String>,
    #[schema(example = "Sparkling water 500ml")]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Decimal number or decimal string.
    #[schema(value_type = f64, example = 1.25)]
    pub price: Option<Value>,
    #[schema(example = 48)]
    pub stock: Option<i64>,
    pub active: Option<bool>,
}

/// Relative stock change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StockAdjustmentRequest {
    #[schema(example = -3)]
    pub delta: Option<i64>,
}

/// Product listing filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

/// Result of removing a product.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRemovalResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: ProductId,
    /// `deleted`, or `deactivated` when order history references it.
    #[schema(example = "deactivated")]
    pub outcome: &'static str,
}

fn parse_category(payload: CategoryRequest) -> Result<CategoryDraft, Error> {
    let name = require(payload.name, FieldName::new("name"))?;
    CategoryDraft::new(&name, payload.description.as_deref())
}

fn parse_product(payload: ProductRequest) -> Result<ProductDraft, Error> {
    let category_id =
        parse_optional_id(payload.category_id.as_deref(), FieldName::new("categoryId"))?;
    let name = require(payload.name, FieldName::new("name"))?;
    let price_field = FieldName::new("price");
    let price = parse_amount(require(payload.price, price_field)?, price_field)?;
    ProductDraft::new(
        category_id,
        &name,
        payload.description.as_deref(),
        price,
        payload.stock.unwrap_or(0),
        payload.active.unwrap_or(true),
    )
}

/// Categories of the caller's organization, by name.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories", body = Envelope<Vec<Category>>),
        (status = 401, description = "Unauthorised", body = ErrorEnvelope),
        (status = 403, description = "No organization", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "listCategories"
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
    tenant: Tenant,
) -> ApiResult<HttpResponse> {
    let categories = state.catalog.list_categories(&tenant.context).await?;
    Ok(ok(categories))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Envelope<Category>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 409, description = "Duplicate name", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "createCategory"
)]
#[post("/categories")]
pub async fn create_category(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<CategoryRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_category(payload.into_inner())?;
    let category = state.catalog.create_category(&tenant.context, draft).await?;
    Ok(created(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Envelope<Category>),
        (status = 404, description = "Category not found", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "getCategory"
)]
#[get("/categories/{id}")]
pub async fn get_category(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, FieldName::new("id"))?;
    let category = state.catalog.category(&tenant.context, id).await?;
    Ok(ok(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Envelope<Category>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 404, description = "Category not found", body = ErrorEnvelope),
        (status = 409, description = "Duplicate name", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "updateCategory"
)]
#[put("/categories/{id}")]
pub async fn update_category(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<CategoryRequest>,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, FieldName::new("id"))?;
    let draft = parse_category(payload.into_inner())?;
    let category = state
        .catalog
        .update_category(&tenant.context, id, draft)
        .await?;
    Ok(ok(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = Envelope<Deleted>),
        (status = 404, description = "Category not found", body = ErrorEnvelope),
        (status = 409, description = "Category still in use", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "deleteCategory"
)]
#[delete("/categories/{id}")]
pub async fn delete_category(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: CategoryId = parse_id(&path, FieldName::new("id"))?;
    state.catalog.delete_category(&tenant.context, id).await?;
    Ok(ok(Deleted { id: *id.as_uuid() }))
}

/// Products, by name, optionally filtered by category and name fragment.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Page of products", body = Envelope<Vec<Product>>),
        (status = 400, description = "Invalid filter or cursor", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "listProducts"
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<HttpState>,
    tenant: Tenant,
    query: web::Query<ProductQuery>,
) -> ApiResult<HttpResponse> {
    let ProductQuery {
        category_id,
        search,
        cursor,
        limit,
    } = query.into_inner();
    let filter = ProductFilter {
        category_id: parse_optional_id(category_id.as_deref(), FieldName::new("categoryId"))?,
        search: search.filter(|term| !term.trim().is_empty()),
    };
    let page = page_request(cursor.as_deref(), limit)?;
    let products = state
        .catalog
        .list_products(&tenant.context, filter, page)
        .await?;
    Ok(paged(products))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = Envelope<Product>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 404, description = "Category not found", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "createProduct"
)]
#[post("/products")]
pub async fn create_product(
    state: web::Data<HttpState>,
    tenant: Tenant,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_product(payload.into_inner())?;
    let product = state.catalog.create_product(&tenant.context, draft).await?;
    Ok(created(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Envelope<Product>),
        (status = 404, description = "Product not found", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "getProduct"
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, FieldName::new("id"))?;
    let product = state.catalog.product(&tenant.context, id).await?;
    Ok(ok(product))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Envelope<Product>),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 404, description = "Product or category not found", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "updateProduct"
)]
#[put("/products/{id}")]
pub async fn update_product(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, FieldName::new("id"))?;
    let draft = parse_product(payload.into_inner())?;
    let product = state
        .catalog
        .update_product(&tenant.context, id, draft)
        .await?;
    Ok(ok(product))
}

/// Delete a product, or deactivate it when order history references it.
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product removed", body = Envelope<ProductRemovalResponse>),
        (status = 404, description = "Product not found", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "deleteProduct"
)]
#[delete("/products/{id}")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, FieldName::new("id"))?;
    let outcome = match state.catalog.delete_product(&tenant.context, id).await? {
        ProductRemoval::Deleted => "deleted",
        ProductRemoval::Deactivated => "deactivated",
    };
    Ok(ok(ProductRemovalResponse { id, outcome }))
}

/// Add `delta` to the stock; the result must stay non-negative.
#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}/stock",
    params(("id" = String, Path, description = "Product id")),
    request_body = StockAdjustmentRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = Envelope<Product>),
        (status = 400, description = "Stock would go negative", body = ErrorEnvelope),
        (status = 404, description = "Product not found", body = ErrorEnvelope)
    ),
    tags = ["catalog"],
    operation_id = "adjustStock"
)]
#[patch("/products/{id}/stock")]
pub async fn adjust_stock(
    state: web::Data<HttpState>,
    tenant: Tenant,
    path: web::Path<String>,
    payload: web::Json<StockAdjustmentRequest>,
) -> ApiResult<HttpResponse> {
    let id: ProductId = parse_id(&path, FieldName::new("id"))?;
    let delta = require(payload.into_inner().delta, FieldName::new("delta"))?;
    let product = state
        .catalog
        .adjust_stock(&tenant.context, id, delta)
        .await?;
    Ok(ok(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, Money};
    use crate::inbound::http::test_utils::{
        TestPorts, authed, error_code, member, organization_id, same_organization, test_app,
    };
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use pagination::Page;
    use rstest::rstest;
    use serde_json::json;

    fn product(id: ProductId, stock: u32) -> Product {
        Product {
            id,
            organization_id: organization_id(),
            category_id: None,
            name: "Sparkling water".into(),
            description: None,
            price: Money::from_cents(125).expect("price"),
            stock,
            active: true,
        }
    }

    #[rstest]
    fn product_payload_defaults_stock_and_active() {
        let draft = parse_product(ProductRequest {
            name: Some("Water".into()),
            price: Some(json!("1.25")),
            ..ProductRequest::default()
        })
        .expect("valid");
        assert_eq!(draft.stock, 0);
        assert!(draft.active);
        assert_eq!(draft.price.cents(), 125);
    }

    #[rstest]
    #[case::negative_price(json!({ "name": "Water", "price": -1 }), "price")]
    #[case::missing_price(json!({ "name": "Water" }), "price")]
    #[case::negative_stock(json!({ "name": "Water", "price": 1, "stock": -4 }), "stock")]
    #[case::bad_category(json!({ "name": "Water", "price": 1, "categoryId": "x" }), "categoryId")]
    fn product_payload_rejects_invalid_fields(#[case] raw: Value, #[case] field: &str) {
        let payload: ProductRequest = serde_json::from_value(raw).expect("payload shape");
        let err = parse_product(payload).expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(
            err.details().and_then(|details| details.get("field")),
            Some(&json!(field))
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn list_products_passes_filters_and_pagination() {
        let category = CategoryId::random();
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .catalog
            .expect_list_products()
            .withf(move |tenant, filter, page| {
                same_organization(tenant)
                    && filter.category_id == Some(category)
                    && filter.search.as_deref() == Some("wat")
                    && page.limit() == 1
            })
            .returning(|_, _, page| {
                let rows = vec![
                    product(ProductId::random(), 3),
                    product(ProductId::random(), 4),
                ];
                Ok(Page::from_overfetch(rows, page))
            });
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!("/api/v1/products?categoryId={category}&search=wat&limit=1");
        let request = authed(actix_test::TestRequest::get().uri(&uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        assert!(body["pagination"]["nextCursor"].is_string());
    }

    #[rstest]
    #[actix_web::test]
    async fn invalid_cursors_are_rejected() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        let app = actix_test::init_service(test_app(ports)).await;

        let request =
            authed(actix_test::TestRequest::get().uri("/api/v1/products?cursor=!!!")).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("INVALID_CURSOR"));
    }

    #[rstest]
    #[actix_web::test]
    async fn stock_adjustments_surface_insufficient_stock() {
        let id = ProductId::random();
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .catalog
            .expect_adjust_stock()
            .withf(move |_, product, delta| *product == id && *delta == -10)
            .returning(|_, _, _| {
                Err(Error::new(ErrorCode::InsufficientStock, "insufficient stock"))
            });
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!("/api/v1/products/{id}/stock");
        let request = authed(actix_test::TestRequest::patch().uri(&uri))
            .set_json(json!({ "delta": -10 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("INSUFFICIENT_STOCK"));
    }

    #[rstest]
    #[actix_web::test]
    async fn deleting_a_referenced_product_reports_deactivation() {
        let id = ProductId::random();
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .catalog
            .expect_delete_product()
            .returning(|_, _| Ok(ProductRemoval::Deactivated));
        let app = actix_test::init_service(test_app(ports)).await;

        let uri = format!("/api/v1/products/{id}");
        let request = authed(actix_test::TestRequest::delete().uri(&uri)).to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["data"]["outcome"], json!("deactivated"));
        assert_eq!(body["data"]["id"], json!(id.to_string()));
    }

    #[rstest]
    #[actix_web::test]
    async fn category_conflicts_map_to_409() {
        let mut ports = TestPorts::default();
        ports.authenticate_as(member());
        ports
            .catalog
            .expect_create_category()
            .returning(|_, _| Err(Error::new(ErrorCode::CategoryExists, "category exists")));
        let app = actix_test::init_service(test_app(ports)).await;

        let request = authed(actix_test::TestRequest::post().uri("/api/v1/categories"))
            .set_json(json!({ "name": "Drinks" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(error_code(&body), Some("CATEGORY_EXISTS"));
    }
}
