//! Shared Module
//!
//! Plain data records used by the archive manager and by its callers: the
//! archived item model and its lifecycle, HTTP bodies, configuration, and
//! the errors those records raise.
//!
//! # Overview
//!
//! Nothing in this module talks to storage. Every type is serializable and
//! safe to hand across the manager boundary.

/// Archived item model and lifecycle state machine
pub mod archive;

/// HTTP request and response bodies
pub mod api;

/// Shared error types
pub mod error;

/// Vault configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use archive::{
    ArchiveRequest, ArchiveStatus, ArchivedItem, DownloadReference, MetadataUpdate, OwnerStats,
    RestoreReceipt, RestoreTier, StatusTally,
};
pub use config::{ConfigError, TierSettings, VaultConfig, VaultConfigBuilder};
pub use error::SharedError;
