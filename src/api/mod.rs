//! # Backend API
//!
//! Wire types and the HTTP client for the analysis service. The service
//! exposes one endpoint, `GET /query?question=...`, plus static chart images.

pub mod backend;
pub mod types;

pub use backend::{BackendError, HttpBackend, QueryBackend, resolve_asset_url};
pub use types::QueryResponse;
