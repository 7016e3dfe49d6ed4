// src/api/mod.rs
// HTTP API: upload endpoint and health check

pub mod error;
pub mod http;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use http::http_router;
pub use types::*;
