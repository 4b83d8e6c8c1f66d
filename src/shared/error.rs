//! Shared Error Types
//!
//! Errors raised by the plain data records in `shared`. They carry no
//! backend or HTTP context; the manager and the HTTP layer wrap them.
//!
//! ```rust
//! use coldvault::shared::error::SharedError;
//!
//! let error = SharedError::validation("ownerId", "owner id cannot be empty");
//! assert!(error.to_string().contains("ownerId"));
//! ```
use thiserror::Error;

use crate::shared::archive::ArchiveStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// A field of a request or update is unusable
    #[error("invalid {field}: {message}")]
    ValidationError { field: String, message: String },

    /// Not an edge of the lifecycle
    #[error("cannot move from {from} to {to}")]
    InvalidTransition {
        from: ArchiveStatus,
        to: ArchiveStatus,
    },
}

impl SharedError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn transition(from: ArchiveStatus, to: ArchiveStatus) -> Self {
        Self::InvalidTransition { from, to }
    }
}
