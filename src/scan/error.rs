// src/scan/error.rs

/// Why the camera could not be opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CameraFailure {
    #[error("permission denied")]
    PermissionDenied,

    #[error("no camera device")]
    NoDevice,

    #[error("camera requires a secure context")]
    InsecureContext,
}

/// Failures surfaced by the scan controller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("Cannot access camera: {0}")]
    CameraUnavailable(CameraFailure),

    #[error("Camera not ready, please wait")]
    NotReady,

    #[error("Scan error: {0}")]
    Decode(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

impl From<CameraFailure> for ScanError {
    fn from(failure: CameraFailure) -> Self {
        ScanError::CameraUnavailable(failure)
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
