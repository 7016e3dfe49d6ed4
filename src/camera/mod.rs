// src/camera/mod.rs
// Camera source seam: acquire a stream for a facing preference, pull frames from it

pub mod file;
pub mod frame;
pub mod snapshot;

use async_trait::async_trait;

use crate::scan::{CameraFailure, FacingMode};

pub use file::FileCamera;
pub use frame::Frame;
pub use snapshot::SnapshotCamera;

/// A live stream exclusively owned by one scan controller
#[async_trait]
pub trait VideoStream: Send + Sync {
    /// Native resolution, (0, 0) while the stream has no valid frame size
    fn dimensions(&self) -> (u32, u32);

    /// Materialize the current frame
    async fn current_frame(&mut self) -> Result<Frame, CameraFailure>;

    /// Stop all tracks and release the device
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// Anything that can hand out a video stream
#[async_trait]
pub trait CameraSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn request(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, CameraFailure>;
}
