//! Cold vault test suite
//!
//! One test binary: shared helpers in `common`, manager and HTTP tests in
//! `integration`, and lifecycle properties in `property`.

#[macro_use]
pub mod common;
