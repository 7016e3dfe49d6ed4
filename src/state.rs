// src/state.rs
// Shared state for the upload server

use std::sync::Arc;

use crate::config::ScanConfig;
use crate::decoder::BarcodeDecoder;
use crate::scan::{FormatHints, TileConfig};

#[derive(Clone)]
pub struct AppState {
    pub decoder: Arc<dyn BarcodeDecoder>,
    pub hints: FormatHints,
    pub tiles: TileConfig,
    pub max_upload_bytes: usize,
    pub cors_origin: String,
}

impl AppState {
    /// Defaults: all label formats, tiling on, 10 MiB bodies, any origin
    pub fn new(decoder: Arc<dyn BarcodeDecoder>) -> Self {
        Self {
            decoder,
            hints: FormatHints::default(),
            tiles: TileConfig::default(),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_origin: "*".to_string(),
        }
    }

    pub fn from_config(config: &ScanConfig, decoder: Arc<dyn BarcodeDecoder>) -> Self {
        Self {
            decoder,
            hints: FormatHints::default(),
            tiles: config.tile_config(),
            max_upload_bytes: config.max_upload_bytes,
            cors_origin: config.cors_origin.clone(),
        }
    }

    pub fn with_tiles(mut self, tiles: TileConfig) -> Self {
        self.tiles = tiles;
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}
