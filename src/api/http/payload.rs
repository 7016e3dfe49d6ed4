// src/api/http/payload.rs
// Base64 image payloads as posted by the scanner page

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::DynamicImage;

#[derive(Debug, thiserror::Error)]
pub enum ImagePayloadError {
    #[error("data URI is not base64 encoded")]
    NotBase64,

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Strip an optional `data:<mime>;base64,` header
fn payload_body(payload: &str) -> Result<&str, ImagePayloadError> {
    let payload = payload.trim();
    match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest.split_once(',').ok_or(ImagePayloadError::NotBase64)?;
            if !header.ends_with(";base64") {
                return Err(ImagePayloadError::NotBase64);
            }
            Ok(body)
        }
        None => Ok(payload),
    }
}

pub fn decode_image_payload(payload: &str) -> Result<DynamicImage, ImagePayloadError> {
    let body = payload_body(payload)?;
    let bytes = STANDARD.decode(body)?;
    Ok(image::load_from_memory(&bytes)?)
}
