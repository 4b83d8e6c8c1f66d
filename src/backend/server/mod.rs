//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - ServerConfig and catalog loading
//! └── init.rs         - App creation and the reconcile timer
//! ```
//!
//! # State Management
//!
//! `AppState` holds the archive manager, the cold storage backend and the
//! download signer. All of them are cheap to clone and safe to share across
//! handlers.
//!
//! # Example
//!
//! ```rust,no_run
//! use coldvault::backend::server::{ServerConfig, create_app};
//! use coldvault::shared::VaultConfig;
//!
//! # async fn example() {
//! let app = create_app(ServerConfig::from_env(), VaultConfig::default()).await;
//! # }
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use config::ServerConfig;
pub use init::create_app;
pub use state::AppState;
