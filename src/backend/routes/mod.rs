//! Route Configuration Module
//!
//! HTTP routes of the vault server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Router assembly and middleware
//! └── api_routes.rs   - Vault endpoints
//! ```
//!
//! # Routes
//!
//! - `GET /health` - liveness check
//! - `/items/...` - archive, restore, download, metadata, stats
//! - `GET /blobs/{token}` - presigned object downloads
//!
//! Unknown paths fall through to a plain 404.

/// Main router creation
pub mod router;

/// Vault endpoints
pub mod api_routes;

// Re-export commonly used functions
pub use router::create_router;
