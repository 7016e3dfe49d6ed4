// src/camera/snapshot.rs
// IP camera exposing a JPEG snapshot URL; every frame is a fresh GET

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CameraSource, Frame, VideoStream};
use crate::scan::{CameraFailure, FacingMode};

#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    client: reqwest::Client,
    url: String,
    facing: FacingMode,
    require_secure: bool,
}

impl SnapshotCamera {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            facing: FacingMode::Environment,
            require_secure: false,
        })
    }

    /// Which facing mode this camera answers for
    pub fn facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    /// Refuse plain-http snapshot URLs unless they point at this machine
    pub fn require_secure(mut self, require: bool) -> Self {
        self.require_secure = require;
        self
    }

    fn check_context(&self) -> Result<Url, CameraFailure> {
        let url = Url::parse(&self.url).map_err(|e| {
            warn!("Invalid snapshot URL {}: {}", self.url, e);
            CameraFailure::NoDevice
        })?;

        if self.require_secure && url.scheme() != "https" && !is_loopback(&url) {
            warn!("Refusing insecure snapshot URL {}", url);
            return Err(CameraFailure::InsecureContext);
        }
        Ok(url)
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

async fn fetch_frame(client: &reqwest::Client, url: &Url, sequence: u64) -> Result<Frame, CameraFailure> {
    let response = client.get(url.clone()).send().await.map_err(|e| {
        warn!("Snapshot camera unreachable: {}", e);
        CameraFailure::NoDevice
    })?;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(CameraFailure::PermissionDenied);
        }
        status if !status.is_success() => {
            warn!("Snapshot camera returned {}", status);
            return Err(CameraFailure::NoDevice);
        }
        _ => {}
    }

    let bytes = response.bytes().await.map_err(|e| {
        warn!("Snapshot body read failed: {}", e);
        CameraFailure::NoDevice
    })?;
    let image = image::load_from_memory(&bytes).map_err(|e| {
        warn!("Snapshot is not a decodable image: {}", e);
        CameraFailure::NoDevice
    })?;

    Ok(Frame::new(image, sequence))
}

#[async_trait]
impl CameraSource for SnapshotCamera {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn request(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, CameraFailure> {
        if facing != self.facing {
            warn!("Snapshot camera is {}-facing, {} requested", self.facing, facing);
            return Err(CameraFailure::NoDevice);
        }

        let url = self.check_context()?;
        // One fetch up front so the stream has a known size before it is handed out
        let first = fetch_frame(&self.client, &url, 0).await?;
        let dimensions = (first.width(), first.height());
        info!("Snapshot camera ready: {} ({}x{})", url, dimensions.0, dimensions.1);

        Ok(Box::new(SnapshotStream {
            client: self.client.clone(),
            url,
            dimensions,
            sequence: 0,
            live: true,
        }))
    }
}

pub struct SnapshotStream {
    client: reqwest::Client,
    url: Url,
    dimensions: (u32, u32),
    sequence: u64,
    live: bool,
}

#[async_trait]
impl VideoStream for SnapshotStream {
    fn dimensions(&self) -> (u32, u32) {
        if self.live { self.dimensions } else { (0, 0) }
    }

    async fn current_frame(&mut self) -> Result<Frame, CameraFailure> {
        if !self.live {
            return Err(CameraFailure::NoDevice);
        }
        let frame = fetch_frame(&self.client, &self.url, self.sequence + 1).await?;
        self.sequence = frame.sequence;
        self.dimensions = (frame.width(), frame.height());
        debug!("Snapshot frame {} ({}x{})", frame.sequence, frame.width(), frame.height());
        Ok(frame)
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
