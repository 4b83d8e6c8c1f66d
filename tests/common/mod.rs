//! Test helpers
//!
//! - `mock_storage` - a scripted cold storage backend with failure injection
//! - `fixtures` - a manager harness and sample uploads
//! - `assertions` - assertion macros

#[macro_use]
pub mod assertions;
#[cfg(feature = "ssr")]
pub mod fixtures;

#[cfg(feature = "ssr")]
pub use fixtures::*;
#[cfg(feature = "ssr")]
pub use mock_storage::*;
