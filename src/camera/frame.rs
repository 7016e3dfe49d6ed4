// src/camera/frame.rs
// A single still taken from a video stream

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Snapshot of the current video frame at native resolution.
/// Frames are handed out by value; nothing keeps them after a scan.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
    /// Position of this frame in its stream, starting at 1
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: DynamicImage, sequence: u64) -> Self {
        Self {
            image,
            sequence,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn to_jpeg(&self) -> Result<Vec<u8>, image::ImageError> {
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(self.image.to_rgb8());
        let mut buf = Cursor::new(Vec::new());
        rgb.write_to(&mut buf, ImageFormat::Jpeg)?;
        Ok(buf.into_inner())
    }

    /// `data:image/jpeg;base64,...` as posted to the upload endpoint
    pub fn to_jpeg_data_uri(&self) -> Result<String, image::ImageError> {
        let jpeg = self.to_jpeg()?;
        Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg)))
    }
}
