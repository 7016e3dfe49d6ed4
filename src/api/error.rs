// src/api/error.rs
// JSON error responses for the upload API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use tracing::error;

use super::http::payload::ImagePayloadError;
use crate::scan::ScanError;

/// Body: `{ "error": true, "message", "status", "error_code" }`
#[derive(Debug)]
pub struct ApiError {
    pub message: String,
    pub status_code: StatusCode,
    pub error_code: Option<String>,
}

impl ApiError {
    fn with_code(status_code: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            error_code: Some(code.to_string()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Camera or decoder is temporarily unusable
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", message)
    }

    /// A downstream endpoint failed
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_GATEWAY, "BAD_GATEWAY", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": true,
            "message": self.message,
            "status": self.status_code.as_u16()
        });

        if let Some(code) = self.error_code {
            body["error_code"] = json!(code);
        }

        (self.status_code, Json(body)).into_response()
    }
}

impl From<ScanError> for ApiError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Decode(reason) => {
                error!("Barcode decoding failed: {}", reason);
                ApiError::internal(format!("Barcode decoding failed: {reason}"))
            }
            ScanError::CameraUnavailable(_) | ScanError::NotReady => {
                ApiError::unavailable(err.to_string())
            }
            ScanError::Upload(_) => ApiError::bad_gateway(err.to_string()),
        }
    }
}

impl From<ImagePayloadError> for ApiError {
    fn from(err: ImagePayloadError) -> Self {
        ApiError::bad_request(format!("Invalid image: {err}"))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Log and build a 500
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        {
            tracing::error!($msg);
            $crate::api::error::ApiError::internal($msg)
        }
    };
    ($msg:expr, $($arg:tt)*) => {
        {
            let formatted_msg = format!($msg, $($arg)*);
            tracing::error!("{}", formatted_msg);
            $crate::api::error::ApiError::internal(formatted_msg)
        }
    };
}

/// `?`-friendly conversion of foreign errors into a 500
pub trait IntoApiError<T> {
    fn into_api_error(self, message: &str) -> Result<T, ApiError>;
}

impl<T, E> IntoApiError<T> for Result<T, E>
where
    E: fmt::Display,
{
    fn into_api_error(self, message: &str) -> Result<T, ApiError> {
        self.map_err(|e| internal_error!("{}: {}", message, e))
    }
}

pub trait IntoApiErrorOption<T> {
    fn ok_or_bad_request(self, message: &str) -> Result<T, ApiError>;
}

impl<T> IntoApiErrorOption<T> for Option<T> {
    fn ok_or_bad_request(self, message: &str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::bad_request(message))
    }
}
