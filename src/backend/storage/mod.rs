//! Cold Storage Backend
//!
//! The one external collaborator of the archive manager. A backend stores
//! opaque objects under string keys in a storage class, reports restore
//! progress through head metadata, and hands out presigned references.
//!
//! # Module Structure
//!
//! ```text
//! storage/
//! ├── mod.rs     - ColdStorage trait, object metadata, StorageError
//! ├── memory.rs  - In-process backend with simulated restore jobs
//! └── signer.rs  - Signed download tokens for presigned references
//! ```

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// In-process backend
pub mod memory;

/// Download token signing
pub mod signer;

pub use memory::MemoryColdStorage;
pub use signer::{DownloadClaims, DownloadSigner};

/// Storage class of an object, warmest first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    Standard,
    Glacier,
    DeepArchive,
}

impl StorageClass {
    /// Objects in this class must be restored before they can be read
    pub fn is_cold(self) -> bool {
        matches!(self, StorageClass::Glacier | StorageClass::DeepArchive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::Glacier => "GLACIER",
            StorageClass::DeepArchive => "DEEP_ARCHIVE",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restore progress reported alongside object metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreMarker {
    /// A restore job is still running
    pub ongoing: bool,
    /// When the restored copy lapses; set once the job is done
    pub expiry: Option<DateTime<Utc>>,
}

impl RestoreMarker {
    pub fn ongoing() -> Self {
        Self {
            ongoing: true,
            expiry: None,
        }
    }

    pub fn completed(expiry: DateTime<Utc>) -> Self {
        Self {
            ongoing: false,
            expiry: Some(expiry),
        }
    }

    /// Parse an S3-style `x-amz-restore` value
    ///
    /// `ongoing-request="false", expiry-date="Fri, 21 Dec 2012 00:00:00 GMT"`
    ///
    /// For backends that surface the raw header; the in-memory backend
    /// builds markers directly.
    #[allow(dead_code)]
    pub(crate) fn parse(header: &str) -> Option<Self> {
        let ongoing = match quoted_value(header, "ongoing-request")? {
            "true" => true,
            "false" => false,
            _ => return None,
        };
        let expiry = quoted_value(header, "expiry-date")
            .and_then(|raw| DateTime::parse_from_rfc2822(raw).ok())
            .map(|date| date.with_timezone(&Utc));
        Some(Self { ongoing, expiry })
    }
}

#[allow(dead_code)]
fn quoted_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    let start = header.find(name)? + name.len();
    let rest = header[start..].trim_start().strip_prefix('=')?;
    let rest = rest.trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(&rest[..end])
}

/// Object metadata returned by `head`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    pub storage_class: StorageClass,
    pub restore: Option<RestoreMarker>,
    pub content_length: u64,
    pub content_type: String,
}

/// A durable write
#[derive(Debug, Clone)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub storage_class: StorageClass,
    pub metadata: HashMap<String, String>,
}

/// Backend answer to a restore request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreAck {
    /// A new restore job was started, or a live copy was extended
    Accepted,
    /// A job for this object is already running
    AlreadyInProgress,
}

/// Time-limited reference to a single object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Errors raised by a cold storage backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("object {key} not found")]
    NotFound { key: String },

    /// Object is cold and has no live restored copy
    #[error("object {key} is not readable in its current storage state")]
    InvalidObjectState { key: String },

    /// The backend refused the request
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Transient outage; the caller may retry
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Worth retrying later with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_))
    }
}

/// Cold storage operations used by the archive manager
#[async_trait]
pub trait ColdStorage: Send + Sync {
    /// Coldest class this backend offers
    fn coldest_class(&self) -> StorageClass;

    /// Durably write an object
    async fn put(&self, object: PutObject) -> Result<(), StorageError>;

    /// Storage class and restore progress of an object
    async fn head(&self, key: &str) -> Result<ObjectHead, StorageError>;

    /// Ask for a temporary readable copy
    async fn restore(
        &self,
        key: &str,
        tier: &str,
        retention_days: u32,
    ) -> Result<RestoreAck, StorageError>;

    /// Read an object's bytes
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Time-limited reference to an object
    async fn presign(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;

    /// Remove an object
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}
