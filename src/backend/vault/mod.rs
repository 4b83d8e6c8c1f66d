//! Vault Module
//!
//! The archive lifecycle manager and everything it owns: the catalog of
//! archived items, per-item locks, status reconciliation, and the HTTP
//! handlers in front of it.
//!
//! # Module Structure
//!
//! ```text
//! vault/
//! ├── mod.rs        - Module exports and documentation
//! ├── manager.rs    - ArchiveManager operations
//! ├── reconcile.rs  - Backend metadata to status decision table
//! ├── catalog.rs    - Catalog trait and in-memory store
//! ├── sqlite.rs     - SQLite-backed catalog
//! ├── locks.rs      - Per-item async locks
//! ├── error.rs      - ArchiveError
//! └── handlers.rs   - axum handlers
//! ```

/// Archive lifecycle manager
pub mod manager;

/// Status reconciliation rules
pub mod reconcile;

/// Catalog store
pub mod catalog;

/// SQLite catalog
pub mod sqlite;

/// Per-item serialization
pub mod locks;

/// Manager errors
pub mod error;

/// HTTP handlers
pub mod handlers;

pub use catalog::{Catalog, CatalogError, InMemoryCatalog};
pub use error::ArchiveError;
pub use manager::ArchiveManager;
pub use sqlite::SqliteCatalog;
