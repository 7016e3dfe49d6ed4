// src/api/http/router.rs
// HTTP router composition

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::handlers::{health_handler, not_found_handler, upload_handler};
use crate::state::AppState;

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            warn!("Invalid CORS origin '{}' ({}), allowing any", origin, e);
            layer.allow_origin(Any)
        }
    }
}

/// Router serving `/health` and `/upload`
pub fn http_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(app_state.max_upload_bytes))
        .layer(cors_layer(&app_state.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
