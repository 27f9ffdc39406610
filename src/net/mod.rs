//! Network layer: wire types and the backend client.

pub mod api;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use api::{ApiError, Backend, HttpTimeouts, RestBackend};
