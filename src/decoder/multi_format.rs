// src/decoder/multi_format.rs
// Multi-format decoder backed by rxing (ZXing port)

use async_trait::async_trait;
use image::DynamicImage;
use rxing::{
    BarcodeFormat as RxingFormat, DecodeHintType, DecodeHintValue, DecodingHintDictionary,
    Exceptions,
};
use std::collections::HashSet;
use tracing::{debug, warn};

use super::{BarcodeDecoder, DecodeOutcome};
use crate::scan::{BarcodeFormat, DecodedText, FormatHints};

#[derive(Debug, Clone, Copy, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    pub fn new() -> Self {
        Self
    }
}

fn to_rxing(format: BarcodeFormat) -> RxingFormat {
    match format {
        BarcodeFormat::Code128 => RxingFormat::CODE_128,
        BarcodeFormat::Code39 => RxingFormat::CODE_39,
        BarcodeFormat::QrCode => RxingFormat::QR_CODE,
        BarcodeFormat::DataMatrix => RxingFormat::DATA_MATRIX,
    }
}

/// Restrict rxing to the requested symbologies
fn rxing_hints(hints: &FormatHints) -> DecodingHintDictionary {
    let formats: HashSet<RxingFormat> = hints.iter().map(to_rxing).collect();
    let mut dictionary = DecodingHintDictionary::new();
    dictionary.insert(
        DecodeHintType::POSSIBLE_FORMATS,
        DecodeHintValue::PossibleFormats(formats),
    );
    dictionary
}

fn map_format(format: &RxingFormat) -> Option<BarcodeFormat> {
    match format {
        RxingFormat::CODE_128 => Some(BarcodeFormat::Code128),
        RxingFormat::CODE_39 => Some(BarcodeFormat::Code39),
        RxingFormat::QR_CODE => Some(BarcodeFormat::QrCode),
        RxingFormat::DATA_MATRIX => Some(BarcodeFormat::DataMatrix),
        _ => None,
    }
}

#[async_trait]
impl BarcodeDecoder for RxingDecoder {
    fn name(&self) -> &'static str {
        "rxing"
    }

    async fn decode(&self, image: &DynamicImage, hints: &FormatHints) -> DecodeOutcome {
        let luma = image.to_luma8();
        let (width, height) = luma.dimensions();
        if width == 0 || height == 0 {
            return DecodeOutcome::NotFound;
        }
        let pixels = luma.into_raw();
        let mut rx_hints = rxing_hints(hints);

        // CPU-bound; keep it off the async workers
        let joined = tokio::task::spawn_blocking(move || {
            rxing::helpers::detect_multiple_in_luma_with_hints(pixels, width, height, &mut rx_hints)
        })
        .await;

        let results = match joined {
            Ok(Ok(results)) => results,
            Ok(Err(Exceptions::NotFoundException(_))) => return DecodeOutcome::NotFound,
            Ok(Err(e)) => {
                warn!("rxing decode failed: {:?}", e);
                return DecodeOutcome::Failed(format!("{e:?}"));
            }
            Err(e) => {
                warn!("rxing decode task aborted: {}", e);
                return DecodeOutcome::Failed(e.to_string());
            }
        };

        let hits: Vec<DecodedText> = results
            .iter()
            .filter_map(|r| {
                let format = map_format(r.getBarcodeFormat())?;
                if !hints.contains(format) {
                    debug!("Ignoring {} symbol outside hints", format);
                    return None;
                }
                Some(DecodedText::new(r.getText(), format))
            })
            .collect();

        debug!("rxing decoded {} symbol(s) in {}x{}", hits.len(), width, height);
        DecodeOutcome::from_hits(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[tokio::test]
    async fn test_blank_frame_is_not_found() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(120, 80, Luma([255u8])));
        let outcome = RxingDecoder::new().decode(&blank, &FormatHints::default()).await;
        assert_eq!(outcome, DecodeOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_empty_image_short_circuits() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let outcome = RxingDecoder::new().decode(&empty, &FormatHints::default()).await;
        assert_eq!(outcome, DecodeOutcome::NotFound);
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(map_format(&RxingFormat::CODE_128), Some(BarcodeFormat::Code128));
        assert_eq!(map_format(&RxingFormat::DATA_MATRIX), Some(BarcodeFormat::DataMatrix));
        assert_eq!(map_format(&RxingFormat::EAN_13), None);
    }

    #[test]
    fn test_hints_restrict_rxing_formats() {
        let hints = FormatHints::new([BarcodeFormat::Code128, BarcodeFormat::QrCode]);
        let dictionary = rxing_hints(&hints);
        match dictionary.get(&DecodeHintType::POSSIBLE_FORMATS) {
            Some(DecodeHintValue::PossibleFormats(formats)) => {
                assert_eq!(formats.len(), 2);
                assert!(formats.contains(&RxingFormat::CODE_128));
                assert!(formats.contains(&RxingFormat::QR_CODE));
                assert!(!formats.contains(&RxingFormat::CODE_39));
            }
            _ => panic!("possible formats hint missing"),
        }
    }
}
