// src/upload/mod.rs
// Client for the remote /upload endpoint: post a captured frame, get identifiers back

use std::time::Duration;
use tracing::{debug, info};

use crate::api::types::{UploadRequest, UploadResponse};
use crate::camera::Frame;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upload endpoint returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Could not encode frame: {0}")]
    Encode(String),
}

#[derive(Debug, Clone)]
pub struct UploadClient {
    client: reqwest::Client,
    url: String,
}

impl UploadClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `{ "image": <data URI> }`
    pub async fn upload_data_uri(&self, data_uri: String) -> Result<UploadResponse, UploadError> {
        debug!("Uploading {} bytes of image data to {}", data_uri.len(), self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&UploadRequest { image: Some(data_uri) })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or(body);
            return Err(UploadError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: UploadResponse = response.json().await?;
        info!(
            "Upload result: patient_id={:?} accession_number={:?}",
            parsed.patient_id, parsed.accession_number
        );
        Ok(parsed)
    }

    pub async fn upload_frame(&self, frame: &Frame) -> Result<UploadResponse, UploadError> {
        let data_uri = frame
            .to_jpeg_data_uri()
            .map_err(|e| UploadError::Encode(e.to_string()))?;
        self.upload_data_uri(data_uri).await
    }
}
