//! Response envelopes shared by every endpoint.
//!
//! ```text
//! {"success": true,  "data": …, "pagination"?: {"limit": n, "nextCursor": …}}
//! {"success": false, "error": "…", "code": "…", "details"?: …, "traceId"?: "…"}
//! ```

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use pagination::Page;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, ErrorCode};

use super::cache_control::private_no_cache_header;

/// Paging metadata attached to list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    #[schema(example = 20)]
    pub limit: u32,
    /// Opaque cursor for the next page; `null` on the last page.
    pub next_cursor: Option<String>,
}

/// Successful response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    #[schema(example = true)]
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> Envelope<T> {
    /// Wrap `data` without paging metadata.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }
}

impl<T> From<Page<T>> for Envelope<Vec<T>> {
    fn from(page: Page<T>) -> Self {
        let (items, limit, next_cursor) = page.into_parts();
        Self {
            success: true,
            data: items,
            pagination: Some(PaginationMeta { limit, next_cursor }),
        }
    }
}

/// Failed response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[schema(example = false)]
    pub success: bool,
    /// Human readable message.
    #[schema(example = "insufficient stock for product")]
    pub error: String,
    /// Stable machine-readable code.
    #[schema(value_type = String, example = "INSUFFICIENT_STOCK")]
    pub code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub trace_id: Option<String>,
}

impl From<&Error> for ErrorEnvelope {
    fn from(error: &Error) -> Self {
        Self {
            success: false,
            error: error.message().to_owned(),
            code: error.code(),
            details: error.details().cloned(),
            trace_id: error.trace_id().map(str::to_owned),
        }
    }
}

/// Identifier of a removed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Deleted {
    pub id: Uuid,
}

fn respond<T: Serialize>(status: StatusCode, body: &Envelope<T>) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(private_no_cache_header())
        .json(body)
}

/// `200 OK` with `data`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, &Envelope::new(data))
}

/// `201 Created` with `data`.
pub fn created<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, &Envelope::new(data))
}

/// `200 OK` with the page items and paging metadata.
pub fn paged<T: Serialize>(page: Page<T>) -> HttpResponse {
    respond(StatusCode::OK, &Envelope::from(page))
}
