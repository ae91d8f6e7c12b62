//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map the
//! [`ErrorKind`] of each [`ErrorCode`] to an HTTP status and render the
//! response envelope; the domain only decides *what* went wrong.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::trace_id::TraceId;

/// Response header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Failure category used by adapters to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request is malformed, fails validation, or conflicts with the
    /// current state of an entity in a way the caller can fix.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// Authenticated but not permitted, including callers without an
    /// organization.
    Forbidden,
    /// The requested resource does not exist within the caller's tenant.
    NotFound,
    /// The request collides with existing data.
    Conflict,
    /// A backing service is temporarily unreachable.
    ServiceUnavailable,
    /// An unexpected failure inside the service.
    Internal,
}

/// Stable machine-readable error code returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 401
    Unauthorized,
    InvalidToken,
    UserNotRegistered,
    // 403
    Forbidden,
    NoOrganization,
    // 400
    ValidationError,
    MissingFields,
    InvalidQuantity,
    InsufficientStock,
    TotalMismatch,
    ProductInactive,
    CourierInactive,
    CourierRequired,
    InvalidStatusTransition,
    EmailRequired,
    InvalidCursor,
    // 404
    NotFound,
    OrganizationNotFound,
    ClientNotFound,
    ProductNotFound,
    CategoryNotFound,
    OrderNotFound,
    CourierNotFound,
    InvitationNotFound,
    RequestNotFound,
    NotificationNotFound,
    // 409
    Conflict,
    UserAlreadyExists,
    AlreadyInOrganization,
    AlreadyMember,
    InvitationExists,
    RequestExists,
    RequestNotPending,
    CategoryExists,
    CategoryInUse,
    ClientHasOrders,
    CourierBusy,
    OrderNotEditable,
    OrderNotDeletable,
    OrderNotAssignable,
    // 503
    ServiceUnavailable,
    // 500
    InternalError,
}

impl ErrorCode {
    /// Category of this code.
    ///
    /// # Examples
    /// ```
    /// use backoffice::domain::{ErrorCode, ErrorKind};
    ///
    /// assert_eq!(ErrorCode::InsufficientStock.kind(), ErrorKind::InvalidRequest);
    /// assert_eq!(ErrorCode::NoOrganization.kind(), ErrorKind::Forbidden);
    /// ```
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::Unauthorized | Self::InvalidToken | Self::UserNotRegistered => {
                ErrorKind::Unauthorized
            }
            Self::Forbidden | Self::NoOrganization => ErrorKind::Forbidden,
            Self::ValidationError
            | Self::MissingFields
            | Self::InvalidQuantity
            | Self::InsufficientStock
            | Self::TotalMismatch
            | Self::ProductInactive
            | Self::CourierInactive
            | Self::CourierRequired
            | Self::InvalidStatusTransition
            | Self::EmailRequired
            | Self::InvalidCursor => ErrorKind::InvalidRequest,
            Self::NotFound
            | Self::OrganizationNotFound
            | Self::ClientNotFound
            | Self::ProductNotFound
            | Self::CategoryNotFound
            | Self::OrderNotFound
            | Self::CourierNotFound
            | Self::InvitationNotFound
            | Self::RequestNotFound
            | Self::NotificationNotFound => ErrorKind::NotFound,
            Self::Conflict
            | Self::UserAlreadyExists
            | Self::AlreadyInOrganization
            | Self::AlreadyMember
            | Self::InvitationExists
            | Self::RequestExists
            | Self::RequestNotPending
            | Self::CategoryExists
            | Self::CategoryInUse
            | Self::ClientHasOrders
            | Self::CourierBusy
            | Self::OrderNotEditable
            | Self::OrderNotDeletable
            | Self::OrderNotAssignable => ErrorKind::Conflict,
            Self::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            Self::InternalError => ErrorKind::Internal,
        }
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
/// - `trace_id`, when present, is non-empty.
///
/// # Examples
/// ```
/// use backoffice::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::OrderNotFound, "order not found");
/// assert_eq!(err.code(), ErrorCode::OrderNotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

/// Validation errors emitted by the fallible constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

impl Error {
    /// Create a new error, panicking if the message is blank.
    ///
    /// Callers pass string literals or formatted messages, so a blank message
    /// is a programming error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(err) => panic!("error messages must satisfy validation: {err}"),
        }
    }

    /// Fallible constructor that validates the message and captures the
    /// ambient trace identifier.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Category of the error code.
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured when the error was created.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use backoffice::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "name" }));
    /// assert!(err.details().is_some());
    /// ```
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Replace the trace identifier, panicking on a blank value.
    pub fn with_trace_id(self, trace_id: impl Into<String>) -> Self {
        match self.try_with_trace_id(trace_id) {
            Ok(value) => value,
            Err(err) => panic!("trace identifiers must satisfy validation: {err}"),
        }
    }

    /// Replace the trace identifier, rejecting blank values.
    pub fn try_with_trace_id(
        mut self,
        trace_id: impl Into<String>,
    ) -> Result<Self, ErrorValidationError> {
        let trace_id = trace_id.into();
        if trace_id.trim().is_empty() {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        self.trace_id = Some(trace_id);
        Ok(self)
    }

    /// Generic validation failure ([`ErrorCode::ValidationError`]).
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            trace_id: value.trace_id,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            trace_id,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        // Deserialised payloads carry their own trace; never the ambient one.
        error.trace_id = None;
        if let Some(trace_id) = trace_id {
            error = error.try_with_trace_id(trace_id)?;
        }
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
mod tests;
