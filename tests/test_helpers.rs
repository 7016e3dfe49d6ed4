// tests/test_helpers.rs
// Scripted camera and decoder doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use checkin_scan::camera::{CameraSource, Frame, VideoStream};
use checkin_scan::decoder::{BarcodeDecoder, DecodeOutcome};
use checkin_scan::scan::{
    BarcodeFormat, CameraFailure, DecodedText, FacingMode, FormatHints, MemorySink,
    ScanController, ScanSettings, TileConfig,
};

pub const FRAME_SIZE: u32 = 64;

pub fn blank_image() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(FRAME_SIZE, FRAME_SIZE, Luma([255u8])))
}

pub fn frame(sequence: u64) -> Frame {
    Frame::new(blank_image(), sequence)
}

pub fn code128(texts: &[&str]) -> DecodeOutcome {
    DecodeOutcome::Found(
        texts
            .iter()
            .map(|t| DecodedText::new(*t, BarcodeFormat::Code128))
            .collect(),
    )
}

// ============================================================================
// DECODER
// ============================================================================

/// Returns queued outcomes in order, then `NotFound` forever
#[derive(Default)]
pub struct ScriptedDecoder {
    script: Mutex<VecDeque<DecodeOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn new(outcomes: Vec<DecodeOutcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn push(&self, outcome: DecodeOutcome) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BarcodeDecoder for ScriptedDecoder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn decode(&self, _image: &DynamicImage, _hints: &FormatHints) -> DecodeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DecodeOutcome::NotFound)
    }
}

// ============================================================================
// CAMERA
// ============================================================================

/// Hands out blank 64x64 streams, or refuses with a fixed failure
pub struct ScriptedCamera {
    failure: Option<CameraFailure>,
    requests: AtomicUsize,
}

impl ScriptedCamera {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            requests: AtomicUsize::new(0),
        })
    }

    pub fn failing(failure: CameraFailure) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(failure),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraSource for ScriptedCamera {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn request(&self, _facing: FacingMode) -> Result<Box<dyn VideoStream>, CameraFailure> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(Box::new(BlankStream {
                sequence: 0,
                live: true,
            })),
        }
    }
}

pub struct BlankStream {
    sequence: u64,
    live: bool,
}

#[async_trait]
impl VideoStream for BlankStream {
    fn dimensions(&self) -> (u32, u32) {
        if self.live { (FRAME_SIZE, FRAME_SIZE) } else { (0, 0) }
    }

    async fn current_frame(&mut self) -> Result<Frame, CameraFailure> {
        if !self.live {
            return Err(CameraFailure::NoDevice);
        }
        self.sequence += 1;
        Ok(frame(self.sequence))
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

// ============================================================================
// CONTROLLER
// ============================================================================

pub struct Harness {
    pub controller: ScanController,
    pub camera: Arc<ScriptedCamera>,
    pub decoder: Arc<ScriptedDecoder>,
    pub sink: Arc<MemorySink>,
}

/// Controller over scripted doubles, tiling off so each frame is one decode call
pub fn harness(camera: Arc<ScriptedCamera>, outcomes: Vec<DecodeOutcome>) -> Harness {
    let decoder = ScriptedDecoder::new(outcomes);
    let sink = Arc::new(MemorySink::new());
    let settings = ScanSettings {
        tiles: TileConfig::disabled(),
        ..ScanSettings::default()
    };
    let controller = ScanController::new(camera.clone(), decoder.clone(), sink.clone(), settings);

    Harness {
        controller,
        camera,
        decoder,
        sink,
    }
}
