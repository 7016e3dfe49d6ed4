// src/config/mod.rs
// All settings come from the environment (or .env), with defaults for local use

use once_cell::sync::Lazy;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::scan::{FacingMode, TileConfig};

#[derive(Debug, Clone)]
pub struct ScanConfig {
    // ── Upload Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_upload_bytes: usize,

    // ── Upload Client
    pub upload_url: String,
    pub upload_timeout: u64,

    // ── Camera
    pub facing: FacingMode,
    pub camera_dir: String,
    pub snapshot_url: String,
    pub require_secure_camera: bool,

    // ── Decoding
    pub tile_fallback: bool,
    pub tile_size: u32,
    pub tile_stride: u32,

    // ── Continuous Mode
    pub continuous_interval_ms: u64,
}

/// Strip trailing `# comments` and whitespace, then parse
fn parse_env_value<T: FromStr>(raw: &str) -> Option<T> {
    let clean = raw.split('#').next().unwrap_or("").trim();
    clean.parse::<T>().ok()
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => match parse_env_value(&val) {
            Some(parsed) => {
                debug!("Config: {} set from environment", key);
                parsed
            }
            None => {
                warn!("Config: {} = '{}' (parse failed, using default)", key, val);
                default
            }
        },
        Err(_) => default,
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origin: "*".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            upload_url: "http://localhost:5000/upload".to_string(),
            upload_timeout: 30,
            facing: FacingMode::Environment,
            camera_dir: "./camera".to_string(),
            snapshot_url: String::new(),
            require_secure_camera: false,
            tile_fallback: true,
            tile_size: 250,
            tile_stride: 150,
            continuous_interval_ms: 250,
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            debug!(".env file not found, using environment variables and defaults");
        }

        let defaults = Self::default();
        Self {
            host: env_var_or("SCAN_HOST", defaults.host),
            port: env_var_or("SCAN_PORT", defaults.port),
            cors_origin: env_var_or("SCAN_CORS_ORIGIN", defaults.cors_origin),
            max_upload_bytes: env_var_or("SCAN_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            upload_url: env_var_or("SCAN_UPLOAD_URL", defaults.upload_url),
            upload_timeout: env_var_or("SCAN_UPLOAD_TIMEOUT", defaults.upload_timeout),
            facing: env_var_or("SCAN_FACING", defaults.facing),
            camera_dir: env_var_or("SCAN_CAMERA_DIR", defaults.camera_dir),
            snapshot_url: env_var_or("SCAN_SNAPSHOT_URL", defaults.snapshot_url),
            require_secure_camera: env_var_or(
                "SCAN_REQUIRE_SECURE_CAMERA",
                defaults.require_secure_camera,
            ),
            tile_fallback: env_var_or("SCAN_TILE_FALLBACK", defaults.tile_fallback),
            tile_size: env_var_or("SCAN_TILE_SIZE", defaults.tile_size),
            tile_stride: env_var_or("SCAN_TILE_STRIDE", defaults.tile_stride),
            continuous_interval_ms: env_var_or(
                "SCAN_CONTINUOUS_INTERVAL_MS",
                defaults.continuous_interval_ms,
            ),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout)
    }

    /// Interval between continuous-mode ticks, never below 10ms
    pub fn continuous_interval(&self) -> Duration {
        Duration::from_millis(self.continuous_interval_ms.max(10))
    }

    /// Tile settings, with out-of-range size or stride replaced by defaults
    pub fn tile_config(&self) -> TileConfig {
        TileConfig::checked(self.tile_fallback, self.tile_size, self.tile_stride)
    }

    /// Snapshot endpoint, if one is configured
    pub fn snapshot_url(&self) -> Option<&str> {
        let url = self.snapshot_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<ScanConfig> = Lazy::new(ScanConfig::from_env);
