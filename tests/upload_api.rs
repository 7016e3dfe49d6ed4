// tests/upload_api.rs
// POST /upload and GET /health against the router, no network

mod test_helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use serde_json::{Value, json};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

use checkin_scan::AppState;
use checkin_scan::api::http_router;
use checkin_scan::api::types::UploadResponse;
use checkin_scan::decoder::DecodeOutcome;
use checkin_scan::scan::TileConfig;
use test_helpers::{ScriptedDecoder, blank_image, code128};

fn png_data_uri() -> String {
    let mut bytes = Vec::new();
    blank_image()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

fn create_test_app(decoder: Arc<ScriptedDecoder>) -> axum::Router {
    let state = AppState::new(decoder).with_tiles(TileConfig::disabled());
    http_router(Arc::new(state))
}

async fn post_upload(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_missing_image_is_bad_request() {
    let decoder = ScriptedDecoder::new(vec![]);
    let app = create_test_app(decoder.clone());

    let (status, body) = post_upload(app.clone(), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image provided");
    assert_eq!(body["error_code"], "BAD_REQUEST");

    let (status, _) = post_upload(app, json!({ "image": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(decoder.calls(), 0);
}

#[tokio::test]
async fn test_valid_image_returns_identifiers() {
    let decoder = ScriptedDecoder::new(vec![code128(&[
        "A123456",
        "NOT-AN-ID",
        "pwh123456789x",
    ])]);
    let app = create_test_app(decoder.clone());

    let (status, body) = post_upload(app, json!({ "image": png_data_uri() })).await;

    assert_eq!(status, StatusCode::OK);
    let parsed: UploadResponse = serde_json::from_value(body).unwrap();
    assert_eq!(parsed.patient_id.as_deref(), Some("A123456"));
    assert_eq!(parsed.accession_number.as_deref(), Some("PWH123456789X"));
    assert_eq!(decoder.calls(), 1);
}

#[tokio::test]
async fn test_nothing_found_returns_nulls() {
    let decoder = ScriptedDecoder::new(vec![DecodeOutcome::NotFound]);
    let app = create_test_app(decoder);

    // Bare base64 without the data URI header is accepted too
    let uri = png_data_uri();
    let bare = uri.split_once(',').unwrap().1.to_string();
    let (status, body) = post_upload(app, json!({ "image": bare })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "patient_id": null, "accession_number": null }));
}

#[tokio::test]
async fn test_garbage_payload_is_bad_request() {
    let decoder = ScriptedDecoder::new(vec![]);
    let app = create_test_app(decoder.clone());

    let (status, body) =
        post_upload(app, json!({ "image": "data:image/jpeg;base64,bm90IGFuIGltYWdl" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Invalid image"));
    assert_eq!(decoder.calls(), 0);
}

#[tokio::test]
async fn test_decoder_failure_is_internal_error() {
    let decoder = ScriptedDecoder::new(vec![DecodeOutcome::Failed("out of memory".into())]);
    let app = create_test_app(decoder);

    let (status, body) = post_upload(app, json!({ "image": png_data_uri() })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "INTERNAL_ERROR");
    assert_eq!(body["status"], 500);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let decoder = ScriptedDecoder::new(vec![]);
    let state = AppState::new(decoder.clone()).with_max_upload_bytes(1024);
    let app = http_router(Arc::new(state));

    let (status, _) = post_upload(app, json!({ "image": "A".repeat(4096) })).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(decoder.calls(), 0);
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let app = create_test_app(ScriptedDecoder::new(vec![]));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["decoder"], "scripted");

    let response = app
        .oneshot(Request::builder().uri("/calendar").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
