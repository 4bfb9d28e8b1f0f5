//! Mock API implementation for testing.
//!
//! [`MockApi`] is an in-memory backend implementing every endpoint trait,
//! with the same paging and failure behaviour as the real service.

pub mod api;

pub use api::{MockApi, DEFAULT_OTP};
