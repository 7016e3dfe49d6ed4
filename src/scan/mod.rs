// src/scan/mod.rs
// Scan session: classification, decode pipeline, controller and continuous mode

pub mod classify;
pub mod continuous;
pub mod controller;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod types;

pub use classify::{Classification, classify, normalize};
pub use continuous::{ContinuousScan, ScanEvent, spawn_continuous};
pub use controller::{ScanController, ScanSettings};
pub use error::{CameraFailure, ScanError, ScanResult};
pub use pipeline::{Extraction, TileConfig};
pub use report::{MemorySink, ReportSink, SlotState, TerminalSink};
pub use session::ScanSession;
pub use types::*;
