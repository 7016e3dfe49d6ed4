// src/scan/pipeline.rs
// One extraction pass over an image: decode, optional tile fallback,
// de-duplication and classification. Shared by the controller and /upload.

use image::DynamicImage;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::classify::{Classification, classify, normalize};
use super::error::ScanError;
use super::types::{DecodedText, Field, FormatHints};
use crate::decoder::{BarcodeDecoder, DecodeOutcome};

/// Multi-tile fallback settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileConfig {
    pub enabled: bool,
    pub size: u32,
    pub stride: u32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 250,
            stride: 150,
        }
    }
}

impl TileConfig {
    /// Build from raw settings. A zero size falls back to the defaults; a
    /// stride outside `1..=size` falls back to the default stride (capped at size).
    pub fn checked(enabled: bool, size: u32, stride: u32) -> Self {
        let defaults = Self::default();
        if size == 0 {
            warn!(
                "Tile size 0 is invalid, using {}x{} tiles with stride {}",
                defaults.size, defaults.size, defaults.stride
            );
            return Self { enabled, ..defaults };
        }
        let stride = if (1..=size).contains(&stride) {
            stride
        } else {
            let fallback = defaults.stride.min(size);
            warn!(
                "Tile stride {} outside 1..={}, using {}",
                stride, size, fallback
            );
            fallback
        };
        Self {
            enabled,
            size,
            stride,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Tile start offsets along one axis. Tiles overlap by `size - stride` and
/// the last one is pinned to the far edge so the whole extent is covered.
pub fn tile_origins(extent: u32, size: u32, stride: u32) -> Vec<u32> {
    if size == 0 || extent <= size {
        return vec![0];
    }
    let stride = stride.clamp(1, size);
    let last = extent - size;

    let mut origins: Vec<u32> = (0..last).step_by(stride as usize).collect();
    origins.push(last);
    origins
}

/// (x, y, width, height) of every tile over a `width`×`height` image
pub fn tile_rects(width: u32, height: u32, config: &TileConfig) -> Vec<(u32, u32, u32, u32)> {
    let tile_w = config.size.min(width);
    let tile_h = config.size.min(height);
    let xs = tile_origins(width, config.size, config.stride);
    let ys = tile_origins(height, config.size, config.stride);

    ys.iter()
        .flat_map(|&y| xs.iter().map(move |&x| (x, y, tile_w, tile_h)))
        .collect()
}

/// Everything one pass learned about a frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Distinct raw texts in decode order
    pub texts: Vec<String>,
    /// First patient ID candidate, normalized
    pub patient_id: Option<String>,
    /// First accession number candidate, normalized
    pub accession_number: Option<String>,
    pub used_tiles: bool,
}

impl Extraction {
    pub fn candidate(&self, field: Field) -> Option<&str> {
        match field {
            Field::PatientId => self.patient_id.as_deref(),
            Field::AccessionNumber => self.accession_number.as_deref(),
        }
    }

    pub fn nothing_decoded(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Collapse duplicates on exact text, keeping first-seen order
fn push_distinct(texts: &mut Vec<String>, seen: &mut HashSet<String>, hits: Vec<DecodedText>) {
    for hit in hits {
        if seen.insert(hit.text.clone()) {
            texts.push(hit.text);
        } else {
            debug!("Duplicate decode ignored: {}", hit.text);
        }
    }
}

/// First match per field wins; later matches are dropped and logged
pub fn classify_texts(texts: &[String]) -> (Option<String>, Option<String>) {
    let mut patient_id: Option<String> = None;
    let mut accession_number: Option<String> = None;

    for text in texts {
        let slot = match classify(text) {
            Classification::PatientId => &mut patient_id,
            Classification::AccessionNumber => &mut accession_number,
            Classification::Unclassified => {
                debug!("Unclassified barcode text: {}", text);
                continue;
            }
        };
        if let Some(kept) = slot.as_ref() {
            debug!("Discarding {} (already have {} this pass)", text, kept);
        } else {
            *slot = Some(normalize(text));
        }
    }

    (patient_id, accession_number)
}

async fn decode_tiles(
    decoder: &dyn BarcodeDecoder,
    image: &DynamicImage,
    hints: &FormatHints,
    rects: &[(u32, u32, u32, u32)],
) -> Result<Vec<DecodedText>, ScanError> {
    let mut hits = Vec::new();
    let mut failures = 0usize;
    let mut last_error = String::new();

    for &(x, y, w, h) in rects {
        let tile = image.crop_imm(x, y, w, h);
        match decoder.decode(&tile, hints).await {
            DecodeOutcome::Found(found) => {
                debug!("Tile ({}, {}) decoded {} symbol(s)", x, y, found.len());
                hits.extend(found);
            }
            DecodeOutcome::NotFound => {}
            DecodeOutcome::Failed(reason) => {
                warn!("Tile ({}, {}) decode failed: {}", x, y, reason);
                failures += 1;
                last_error = reason;
            }
        }
    }

    if failures == rects.len() {
        return Err(ScanError::Decode(last_error));
    }
    Ok(hits)
}

/// Run one extraction pass. `Err` only for decoder failures; an image with
/// no barcodes is an `Extraction` with no texts.
pub async fn extract(
    decoder: &dyn BarcodeDecoder,
    image: &DynamicImage,
    hints: &FormatHints,
    tiles: &TileConfig,
) -> Result<Extraction, ScanError> {
    let mut texts = Vec::new();
    let mut seen = HashSet::new();
    let mut used_tiles = false;

    match decoder.decode(image, hints).await {
        DecodeOutcome::Found(hits) if !hits.is_empty() => {
            push_distinct(&mut texts, &mut seen, hits)
        }
        DecodeOutcome::Found(_) | DecodeOutcome::NotFound => {
            let rects = tile_rects(image.width(), image.height(), tiles);
            if tiles.enabled && rects.len() > 1 {
                debug!(
                    "{} found nothing in {}x{}, trying {} tiles",
                    decoder.name(),
                    image.width(),
                    image.height(),
                    rects.len()
                );
                let hits = decode_tiles(decoder, image, hints, &rects).await?;
                used_tiles = !hits.is_empty();
                push_distinct(&mut texts, &mut seen, hits);
            }
        }
        DecodeOutcome::Failed(reason) => {
            warn!("{} failed on whole frame: {}", decoder.name(), reason);
            return Err(ScanError::Decode(reason));
        }
    }

    let (patient_id, accession_number) = classify_texts(&texts);
    Ok(Extraction {
        texts,
        patient_id,
        accession_number,
        used_tiles,
    })
}
