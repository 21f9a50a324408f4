//! The error taxonomy of §7, plus the `RouterResult`/`RouterResponse`
//! aliases and `StorageErrorExt` that the rest of the workspace uses to
//! turn a storage miss into the right HTTP-facing error deterministically.

use common_utils::errors::CustomResult;
use serde::Serialize;

pub type RouterResult<T> = CustomResult<T, ApiErrorResponse>;
pub type RouterResponse<T> = CustomResult<ApplicationResponse<T>, ApiErrorResponse>;

/// What a handler hands back to the HTTP layer, before it is serialized.
/// Kept distinct from `ApiErrorResponse` so a handler's happy path can
/// return something other than bare JSON (currently only `Json` is used,
/// but the indirection is what the teacher's `services::ApplicationResponse`
/// buys: one seam to add a redirect/form response later).
#[derive(Debug)]
pub enum ApplicationResponse<T> {
    Json(T),
    JsonWithStatusCode(T, u16),
}

/// §7's stable error taxonomy. Every variant carries what the HTTP layer
/// needs to build `{"error": {"type", "message", ...}}`.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiErrorResponse {
    #[error("missing or invalid api key")]
    AuthenticationError { message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String, param: Option<String> },

    #[error("{message}")]
    InvalidRequestError { message: String },

    #[error("resource not found: {message}")]
    NotFound { message: String },

    #[error("payment is in an invalid state for this operation: {message}")]
    InvalidState { message: String },

    #[error("idempotency key reused with a different request body")]
    IdempotencyConflict,

    #[error("too many requests")]
    RateLimited,

    #[error("the acquirer declined the payment: {message}")]
    ProcessorDeclined { message: String, code: Option<String> },

    #[error("the request timed out")]
    Timeout,

    #[error("internal server error")]
    InternalServerError,
}

impl ApiErrorResponse {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::AuthenticationError { .. } => "authentication_error",
            Self::ValidationError { .. } => "validation_error",
            Self::InvalidRequestError { .. }
            | Self::NotFound { .. }
            | Self::InvalidState { .. }
            | Self::ProcessorDeclined { .. } => "invalid_request_error",
            Self::IdempotencyConflict => "idempotency_conflict",
            Self::RateLimited => "rate_limited",
            Self::Timeout | Self::InternalServerError => "api_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::AuthenticationError { .. } => 401,
            Self::ValidationError { .. } => 400,
            Self::InvalidRequestError { .. } | Self::InvalidState { .. } | Self::ProcessorDeclined { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::IdempotencyConflict => 409,
            Self::RateLimited => 429,
            Self::Timeout => 504,
            Self::InternalServerError => 500,
        }
    }
}

/// Storage-layer errors (C1), kept separate from `ApiErrorResponse` so the
/// repository port does not depend on the HTTP-facing taxonomy; callers
/// map one to the other via `StorageErrorExt`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    #[error("no such record, or it is not scoped to this merchant")]
    NotFound,
    #[error("a record with this key already exists")]
    UniqueViolation,
    #[error("the expected precondition for this update did not hold (concurrent writer won)")]
    PreconditionFailed,
    #[error("database error: {0}")]
    DatabaseError(String),
}

pub trait StorageErrorExt<T> {
    fn to_not_found_response(self, not_found: ApiErrorResponse) -> RouterResult<T>;
}

impl<T> StorageErrorExt<T> for CustomResult<T, StorageError> {
    fn to_not_found_response(self, not_found: ApiErrorResponse) -> RouterResult<T> {
        self.map_err(|report| {
            let mapped = match report.current_context() {
                StorageError::NotFound => not_found.clone(),
                StorageError::PreconditionFailed => ApiErrorResponse::InvalidState {
                    message: "another request already changed this resource's state".to_string(),
                },
                StorageError::UniqueViolation | StorageError::DatabaseError(_) => {
                    ApiErrorResponse::InternalServerError
                }
            };
            report.change_context(mapped)
        })
    }
}

/// Connector/adapter transport and capability errors (C4), distinct from a
/// domain decline (`AuthorizeOutput::Failed`, which is not an exception).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectorError {
    #[error("adapter `{0}` is not registered")]
    NotFound(String),
    #[error("adapter `{0}` does not support `{1}`")]
    CapabilityNotSupported(String, &'static str),
    #[error("failed to build the outbound request")]
    RequestEncodingFailed,
    #[error("failed to parse the acquirer's response")]
    ResponseDeserializationFailed,
    #[error("transport error calling the acquirer: {0}")]
    TransportError(String),
    #[error("the request to the acquirer timed out")]
    Timeout,
}
