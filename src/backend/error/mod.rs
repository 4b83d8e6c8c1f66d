//! Backend Error Module
//!
//! Error types returned by HTTP handlers and their conversion to HTTP
//! responses.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - BackendError and its status code mapping
//! └── conversion.rs - IntoResponse implementation
//! ```
//!
//! All backend errors implement `IntoResponse`, so a handler returning
//! `Result<_, BackendError>` answers with a JSON body
//! `{"error": ..., "status": ...}` and the mapped status code.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
