// src/decoder/mod.rs
// Barcode decoder seam. The scan workflow only sees this trait, so the
// decoding library is swappable and tests can script results.

pub mod multi_format;

use async_trait::async_trait;
use image::DynamicImage;

use crate::scan::{DecodedText, FormatHints};

pub use multi_format::RxingDecoder;

/// Result of one decode attempt over one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Symbols in decode order (may contain duplicates)
    Found(Vec<DecodedText>),
    /// Decoder ran and saw nothing
    NotFound,
    /// Decoder failed internally
    Failed(String),
}

impl DecodeOutcome {
    /// Normalizes an empty hit list to `NotFound`
    pub fn from_hits(hits: Vec<DecodedText>) -> Self {
        if hits.is_empty() {
            DecodeOutcome::NotFound
        } else {
            DecodeOutcome::Found(hits)
        }
    }
}

#[async_trait]
pub trait BarcodeDecoder: Send + Sync {
    /// Decoder name for logging
    fn name(&self) -> &'static str;

    async fn decode(&self, image: &DynamicImage, hints: &FormatHints) -> DecodeOutcome;
}
