//! Error types for casemap-import
//!
//! Two layers:
//! - `ImportError`: fatal, whole-import failures (no outcome is produced)
//! - `ApiError`: HTTP surface, rendered as `{"error": {"code", "message"}}`
//!
//! Row-level failures never appear here; see `services::row_mapper`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Fatal import failure
#[derive(Debug, Error)]
pub enum ImportError {
    /// Stream could not be read or tokenized
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Corrupt workbook: {0}")]
    CorruptWorkbook(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Configured "newly reported" state is not in the catalog
    #[error("Initial workflow state '{0}' not found in reference catalog")]
    MissingInitialState(String),

    #[error("Reference catalog failure: {0}")]
    Catalog(casemap_common::Error),

    #[error("Failed to persist imported cases: {0}")]
    Persistence(casemap_common::Error),

    #[error("Import cancelled")]
    Cancelled,
}

impl ImportError {
    /// Caller-supplied input problems (as opposed to server faults)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnreadableFile(_)
                | ImportError::CorruptWorkbook(_)
                | ImportError::UnsupportedFormat(_)
        )
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409), e.g. session id already running
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Import(ref err) => {
                let (status, code) = match err {
                    ImportError::Cancelled => (StatusCode::CONFLICT, "IMPORT_CANCELLED"),
                    e if e.is_client_error() => (StatusCode::BAD_REQUEST, "INVALID_FILE"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "IMPORT_FAILED"),
                };
                (status, code, err.to_string())
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
