//! Backend Module
//!
//! All server-side code: the archive lifecycle manager, the cold storage
//! abstraction, and the Axum HTTP server in front of them.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`vault`** - Archive manager, catalog, reconciliation, handlers
//! - **`storage`** - Cold storage trait, in-memory backend, download tokens
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── vault/          - Archive lifecycle manager
//! ├── storage/        - Cold storage backends
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! └── error/          - Error types
//! ```
//!
//! # Control Flow
//!
//! Handlers call `ArchiveManager` operations. The manager talks to one
//! `ColdStorage` backend and one `Catalog`; no backend type crosses the
//! HTTP boundary. Restore completion is paced by the backend, so status is
//! re-derived by polling (`reconcile_status`) rather than pushed.
//!
//! # Thread Safety
//!
//! - Per-item async locks serialize mutations of the same item
//! - Catalogs and backends are `Send + Sync` and shared through `Arc`
//! - Backend calls are async and never block the runtime

/// Archive lifecycle manager
pub mod vault;

/// Cold storage backends
pub mod storage;

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use error::BackendError;
pub use server::create_app;
pub use storage::{ColdStorage, MemoryColdStorage};
pub use vault::{ArchiveError, ArchiveManager};
