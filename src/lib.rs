//! Cold Vault - Main Library
//!
//! An archive lifecycle manager for photos kept in cold storage. Items are
//! written in the coldest storage class, restored on request, reconciled by
//! polling backend metadata, and downloaded through short-lived presigned
//! references.
//!
//! # Lifecycle
//!
//! ```text
//! Uploading -> Archived -> RestoreRequested -> Restoring -> Restored
//!                  ^                                           |
//!                  +---------------- expiry -------------------+
//! ```
//!
//! `Failed` is reachable from `Uploading` and `RestoreRequested`.
//!
//! # Module Structure
//!
//! - **`shared`** - Plain data records used on both sides of the HTTP boundary
//!   - Archived item model and lifecycle rules
//!   - Request/response bodies, configuration, error types
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - `ArchiveManager` and its catalog
//!   - `ColdStorage` trait and in-memory backend
//!   - Axum server, routes, error responses
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the backend modules and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use coldvault::backend::storage::{DownloadSigner, MemoryColdStorage};
//! use coldvault::backend::vault::{ArchiveManager, InMemoryCatalog};
//! use coldvault::shared::{ArchiveRequest, RestoreTier, VaultConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = MemoryColdStorage::new(DownloadSigner::new(b"secret"), "http://localhost:3000");
//! let manager = ArchiveManager::new(
//!     Arc::new(storage),
//!     Arc::new(InMemoryCatalog::new()),
//!     VaultConfig::default(),
//! );
//!
//! let content = Bytes::from_static(b"...");
//! let request = ArchiveRequest::new("u1", "cat.png", "image/png", content.len() as u64);
//! let item = manager.archive(request, content).await?;
//! manager.request_restore(item.id, RestoreTier::Standard).await?;
//! let status = manager.reconcile_status(item.id).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
