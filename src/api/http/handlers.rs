// src/api/http/handlers.rs
// Upload and health handlers

use axum::{Json, extract::State, http::Uri, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::payload::decode_image_payload;
use crate::api::error::{ApiError, ApiResult, IntoApiError, IntoApiErrorOption};
use crate::api::types::{UploadRequest, UploadResponse};
use crate::scan::pipeline;
use crate::state::AppState;

/// Health check handler
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "decoder": app_state.decoder.name(),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Decode the posted frame and return whatever identifiers it carries
pub async fn upload_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<UploadRequest>,
) -> ApiResult<Json<UploadResponse>> {
    let payload = request
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or_bad_request("No image provided")?;

    debug!("Upload received ({} bytes of payload)", payload.len());

    let image = tokio::task::spawn_blocking(move || decode_image_payload(&payload))
        .await
        .into_api_error("Image decoding task failed")??;

    let extraction = pipeline::extract(
        app_state.decoder.as_ref(),
        &image,
        &app_state.hints,
        &app_state.tiles,
    )
    .await?;

    info!(
        "Upload {}x{}: {} text(s), patient_id={:?}, accession_number={:?}",
        image.width(),
        image.height(),
        extraction.texts.len(),
        extraction.patient_id,
        extraction.accession_number
    );

    Ok(Json(UploadResponse {
        patient_id: extraction.patient_id,
        accession_number: extraction.accession_number,
    }))
}

/// Anything outside `/health` and `/upload`
pub async fn not_found_handler(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
