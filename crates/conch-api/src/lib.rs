//! # conch-api - Inventory API Access
//!
//! The HTTP collaborator of the console: a [`Transport`] trait taking a
//! method, URL and credential flag and returning a parsed JSON body, a
//! `reqwest` implementation of it, and [`ApiClient`], which knows the
//! inventory API's endpoints and response envelopes.
//!
//! Depends on [`conch_core`] for the entity types.
//!
//! ## Public API
//!
//! - [`Transport`], [`ApiRequest`], [`Method`] - The request seam
//! - [`ReqwestTransport`] - Production transport with per-request cookie forwarding
//! - [`ApiClient`] - `list`, `get`, `device_location`, `assign_devices`
//! - [`FetchError`] - Clonable request failure, mapped onto [`conch_core::Error`]
//!
//! With the `test-helpers` feature, `test_utils::FakeTransport` provides a
//! scripted transport for tests in dependent crates.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod transport;

pub use client::{parse_list, ApiClient};
pub use error::{FetchError, FetchResult};
pub use transport::{ApiRequest, Method, ReqwestTransport, Transport};
