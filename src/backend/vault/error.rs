/**
 * Archive Manager Errors
 *
 * Typed failures of the archive manager. Every operation returns one of
 * these instead of touching shared error state, and no operation leaves the
 * catalog partially mutated when it fails.
 *
 * # Error Categories
 *
 * - `Validation` - bad input, rejected before any backend call
 * - `StorageWriteFailed` / `StorageReadFailed` / `StorageDeleteFailed` -
 *   a backend call failed
 * - `Unavailable` - transient backend outage or timeout; retry with backoff
 * - `NotFound` / `NotRestored` / `InvalidTransition` - item state conflicts
 * - `Catalog` - the catalog store failed
 */

use thiserror::Error;
use uuid::Uuid;

use crate::backend::storage::StorageError;
use crate::backend::vault::catalog::CatalogError;
use crate::shared::archive::ArchiveStatus;
use crate::shared::SharedError;

/// Errors returned by `ArchiveManager`
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("failed to write {key} to cold storage: {source}")]
    StorageWriteFailed {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to read {key} from cold storage: {source}")]
    StorageReadFailed {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to delete {key} from cold storage: {source}")]
    StorageDeleteFailed {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("archived item {id} not found")]
    NotFound { id: Uuid },

    #[error("archived item {id} is not restored (status: {status})")]
    NotRestored { id: Uuid, status: ArchiveStatus },

    #[error("cold storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("cannot move item from {from} to {to}")]
    InvalidTransition {
        from: ArchiveStatus,
        to: ArchiveStatus,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Which backend call failed
#[derive(Debug, Clone, Copy)]
pub(crate) enum StorageOp {
    Write,
    Read,
    Delete,
}

impl ArchiveError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Map a backend failure, keeping transient outages distinct
    pub(crate) fn storage(op: StorageOp, key: &str, source: StorageError) -> Self {
        if source.is_transient() {
            return Self::Unavailable {
                message: source.to_string(),
            };
        }
        let key = key.to_string();
        match op {
            StorageOp::Write => Self::StorageWriteFailed { key, source },
            StorageOp::Read => Self::StorageReadFailed { key, source },
            StorageOp::Delete => Self::StorageDeleteFailed { key, source },
        }
    }

    /// The caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

impl From<SharedError> for ArchiveError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::ValidationError { field, message } => Self::Validation { field, message },
            SharedError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
        }
    }
}
