/**
 * Backend Error Types
 *
 * Errors returned by HTTP handlers. Each variant maps to an HTTP status
 * code; `conversion` turns them into JSON responses.
 *
 * # Error Types
 *
 * - `HandlerError` - request-level failures (bad multipart body, bad token)
 * - `SharedError` - validation and lifecycle errors from shared types
 * - `Archive` - failures of the archive manager
 *
 * # Status Code Mapping
 *
 * | archive error | status |
 * |---|---|
 * | `Validation` | 400 |
 * | `NotFound` | 404 |
 * | `NotRestored`, `InvalidTransition` | 409 |
 * | `StorageWriteFailed`, `StorageReadFailed`, `StorageDeleteFailed` | 502 |
 * | `Unavailable` | 503 |
 * | `Catalog` | 500 |
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::vault::ArchiveError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// ```rust
/// use axum::http::StatusCode;
/// use coldvault::backend::error::BackendError;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "missing file field");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g. malformed multipart body, invalid download token)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Error raised by shared types
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Archive manager error
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for a 400 handler error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::BAD_REQUEST, message)
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::InvalidTransition { .. } => StatusCode::CONFLICT,
            },
            Self::Archive(err) => match err {
                ArchiveError::Validation { .. } => StatusCode::BAD_REQUEST,
                ArchiveError::NotFound { .. } => StatusCode::NOT_FOUND,
                ArchiveError::NotRestored { .. } | ArchiveError::InvalidTransition { .. } => {
                    StatusCode::CONFLICT
                }
                ArchiveError::StorageWriteFailed { .. }
                | ArchiveError::StorageReadFailed { .. }
                | ArchiveError::StorageDeleteFailed { .. } => StatusCode::BAD_GATEWAY,
                ArchiveError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                ArchiveError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::SharedError(err) => err.to_string(),
            Self::Archive(err) => err.to_string(),
        }
    }
}
