// src/camera/file.rs
// Still camera backed by a directory of images; each frame is the next file

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{CameraSource, Frame, VideoStream};
use crate::scan::{CameraFailure, FacingMode};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

#[derive(Debug, Clone)]
pub struct FileCamera {
    environment_dir: Option<PathBuf>,
    user_dir: Option<PathBuf>,
}

impl FileCamera {
    /// Rear-facing camera reading frames from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            environment_dir: Some(dir.into()),
            user_dir: None,
        }
    }

    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    fn dir_for(&self, facing: FacingMode) -> Option<&Path> {
        match facing {
            FacingMode::Environment => self.environment_dir.as_deref(),
            FacingMode::User => self.user_dir.as_deref(),
        }
    }
}

fn io_failure(err: &std::io::Error) -> CameraFailure {
    match err.kind() {
        ErrorKind::PermissionDenied => CameraFailure::PermissionDenied,
        _ => CameraFailure::NoDevice,
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

async fn list_frames(dir: &Path) -> Result<Vec<PathBuf>, CameraFailure> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        warn!("Cannot open camera directory {}: {}", dir.display(), e);
        io_failure(&e)
    })?;

    let mut frames = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_failure(&e))? {
        let path = entry.path();
        if is_image(&path) {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

#[async_trait]
impl CameraSource for FileCamera {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn request(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, CameraFailure> {
        let dir = self.dir_for(facing).ok_or_else(|| {
            warn!("No {} camera configured", facing);
            CameraFailure::NoDevice
        })?;

        let frames = list_frames(dir).await?;
        let first = frames.first().ok_or_else(|| {
            warn!("Camera directory {} has no images", dir.display());
            CameraFailure::NoDevice
        })?;

        // Header-only read, the stream is "playing" once its size is known
        let dimensions = image::image_dimensions(first).map_err(|e| {
            warn!("Unreadable first frame {}: {}", first.display(), e);
            CameraFailure::NoDevice
        })?;

        info!(
            "File camera ready: {} ({} frames, {}x{})",
            dir.display(),
            frames.len(),
            dimensions.0,
            dimensions.1
        );

        Ok(Box::new(FileStream {
            frames,
            cursor: 0,
            sequence: 0,
            dimensions,
            live: true,
        }))
    }
}

pub struct FileStream {
    frames: Vec<PathBuf>,
    cursor: usize,
    sequence: u64,
    dimensions: (u32, u32),
    live: bool,
}

#[async_trait]
impl VideoStream for FileStream {
    fn dimensions(&self) -> (u32, u32) {
        if self.live { self.dimensions } else { (0, 0) }
    }

    async fn current_frame(&mut self) -> Result<Frame, CameraFailure> {
        if !self.live || self.frames.is_empty() {
            return Err(CameraFailure::NoDevice);
        }

        let path = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();

        let bytes = tokio::fs::read(&path).await.map_err(|e| io_failure(&e))?;
        let image = image::load_from_memory(&bytes).map_err(|e| {
            warn!("Failed to decode frame {}: {}", path.display(), e);
            CameraFailure::NoDevice
        })?;

        self.sequence += 1;
        self.dimensions = (image.width(), image.height());
        debug!("Frame {} from {}", self.sequence, path.display());
        Ok(Frame::new(image, self.sequence))
    }

    fn stop(&mut self) {
        if self.live {
            debug!("File camera stopped after {} frames", self.sequence);
        }
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_frame(dir: &Path, name: &str, w: u32, h: u32) {
        GrayImage::from_pixel(w, h, Luma([255u8]))
            .save(dir.join(name))
            .unwrap();
    }

    #[tokio::test]
    async fn test_frames_cycle_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "b.png", 20, 10);
        write_frame(dir.path(), "a.png", 40, 30);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let camera = FileCamera::new(dir.path());
        let mut stream = camera.request(FacingMode::Environment).await.unwrap();
        assert_eq!(stream.dimensions(), (40, 30));

        let first = stream.current_frame().await.unwrap();
        let second = stream.current_frame().await.unwrap();
        let third = stream.current_frame().await.unwrap();
        assert_eq!((first.width(), first.sequence), (40, 1));
        assert_eq!((second.width(), second.sequence), (20, 2));
        assert_eq!((third.width(), third.sequence), (40, 3));
    }

    #[tokio::test]
    async fn test_missing_directory_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        let camera = FileCamera::new(dir.path().join("absent"));
        let err = camera.request(FacingMode::Environment).await.err();
        assert_eq!(err, Some(CameraFailure::NoDevice));
    }

    #[tokio::test]
    async fn test_unconfigured_facing_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 8, 8);
        let camera = FileCamera::new(dir.path());
        let err = camera.request(FacingMode::User).await.err();
        assert_eq!(err, Some(CameraFailure::NoDevice));
    }

    #[tokio::test]
    async fn test_stopped_stream_has_no_size() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "a.png", 8, 8);
        let mut stream = FileCamera::new(dir.path())
            .request(FacingMode::Environment)
            .await
            .unwrap();
        stream.stop();
        assert!(!stream.is_live());
        assert_eq!(stream.dimensions(), (0, 0));
        assert!(stream.current_frame().await.is_err());
    }
}
