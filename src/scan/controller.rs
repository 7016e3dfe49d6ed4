// src/scan/controller.rs
// Scan session controller: camera lifecycle, capture, decode delegation,
// at-most-once acceptance of identifiers and reporting

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::classify::validate_for;
use super::error::{CameraFailure, ScanError, ScanResult};
use super::pipeline::{self, Extraction, TileConfig};
use super::report::{READY_TEXT, ReportSink, SlotState, UPLOADING_TEXT};
use super::session::ScanSession;
use super::types::{CameraState, FacingMode, Field, FormatHints, ScanReport};
use crate::camera::{CameraSource, Frame, VideoStream};
use crate::decoder::BarcodeDecoder;
use crate::upload::UploadClient;

#[derive(Debug, Clone, Default)]
pub struct ScanSettings {
    pub facing: FacingMode,
    pub hints: FormatHints,
    pub tiles: TileConfig,
}

pub struct ScanController {
    session: ScanSession,
    camera: Arc<dyn CameraSource>,
    decoder: Arc<dyn BarcodeDecoder>,
    sink: Arc<dyn ReportSink>,
    settings: ScanSettings,
    stream: Option<Box<dyn VideoStream>>,
    camera_failure: Option<CameraFailure>,
    continuous_done: bool,
}

impl ScanController {
    pub fn new(
        camera: Arc<dyn CameraSource>,
        decoder: Arc<dyn BarcodeDecoder>,
        sink: Arc<dyn ReportSink>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            session: ScanSession::new(),
            camera,
            decoder,
            sink,
            settings,
            stream: None,
            camera_failure: None,
            continuous_done: false,
        }
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// True once continuous scanning has both identifiers and stopped taking frames
    pub fn is_continuous_done(&self) -> bool {
        self.continuous_done
    }

    // ------------------------------------------------------------------
    // Camera lifecycle
    // ------------------------------------------------------------------

    /// Acquire a stream for `facing`. No automatic retry; call again after a failure.
    pub async fn start_camera(&mut self, facing: FacingMode) -> ScanResult<()> {
        if !self.session.begin_camera_start() {
            debug!("start_camera ignored, camera is {:?}", self.session.camera_state());
            return Ok(());
        }

        info!(
            session = %self.session.id(),
            "Requesting {}-facing camera from {}",
            facing,
            self.camera.name()
        );

        match self.camera.request(facing).await {
            Ok(stream) => {
                self.stream = Some(stream);
                self.camera_failure = None;
                self.session.finish_camera_start(true);
                self.sink
                    .set_both(SlotState::placeholder(READY_TEXT), SlotState::placeholder(""));
                Ok(())
            }
            Err(failure) => {
                warn!(session = %self.session.id(), "Camera acquisition failed: {}", failure);
                self.camera_failure = Some(failure);
                self.session.finish_camera_start(false);
                let err = ScanError::CameraUnavailable(failure);
                self.sink.show_error(&err);
                Err(err)
            }
        }
    }

    /// Stop the stream's tracks and release the device
    pub fn shutdown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!(session = %self.session.id(), "Camera released");
        }
        self.session.camera_released();
    }

    /// Camera is Ready and its stream reports a nonzero size
    pub fn is_ready(&self) -> bool {
        self.ensure_ready().is_ok()
    }

    fn ensure_ready(&self) -> ScanResult<()> {
        match self.session.camera_state() {
            CameraState::Ready => {}
            CameraState::Failed => {
                return Err(ScanError::CameraUnavailable(
                    self.camera_failure.unwrap_or(CameraFailure::NoDevice),
                ));
            }
            CameraState::Uninitialized | CameraState::Starting => return Err(ScanError::NotReady),
        }

        let (width, height) = self
            .stream
            .as_ref()
            .map(|s| s.dimensions())
            .unwrap_or((0, 0));
        if width == 0 || height == 0 {
            return Err(ScanError::NotReady);
        }
        Ok(())
    }

    /// Snapshot of the current video frame. Does not touch session state.
    pub async fn capture_frame(&mut self) -> ScanResult<Frame> {
        self.ensure_ready()?;
        let stream = self.stream.as_mut().ok_or(ScanError::NotReady)?;
        let frame = stream
            .current_frame()
            .await
            .map_err(ScanError::CameraUnavailable)?;

        if frame.width() == 0 || frame.height() == 0 {
            return Err(ScanError::NotReady);
        }
        Ok(frame)
    }

    // ------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------

    /// Manual scan: capture, decode, then replace both identifiers with
    /// what this frame holds. A failed capture or decode leaves the
    /// previous identifiers untouched.
    pub async fn scan(&mut self) -> ScanResult<ScanReport> {
        let frame = match self.capture_frame().await {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e)),
        };

        let extraction = match self.extract(&frame).await {
            Ok(extraction) => extraction,
            Err(e) => return Err(self.fail(e)),
        };

        self.session.reset();
        self.continuous_done = false;
        Ok(self.apply(extraction))
    }

    /// Continuous-mode step for one frame. Never clears identifiers; first
    /// acceptance wins. Returns `None` once both identifiers are held and
    /// the loop is finished.
    pub async fn scan_frame(&mut self, frame: &Frame) -> ScanResult<Option<ScanReport>> {
        if self.continuous_done {
            debug!("Frame {} ignored, continuous scan already complete", frame.sequence);
            return Ok(None);
        }

        let extraction = match self.extract(frame).await {
            Ok(extraction) => extraction,
            Err(e) => return Err(self.fail(e)),
        };

        let report = self.apply(extraction);
        if self.session.is_complete() {
            info!(session = %self.session.id(), "Both identifiers found, stopping continuous scan");
            self.continuous_done = true;
        }
        Ok(Some(report))
    }

    /// Capture a frame and let the remote endpoint do the extraction
    pub async fn upload_scan(&mut self, client: &UploadClient) -> ScanResult<ScanReport> {
        let frame = match self.capture_frame().await {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e)),
        };

        self.sink
            .set_both(SlotState::placeholder(UPLOADING_TEXT), SlotState::placeholder(""));

        let response = match client.upload_frame(&frame).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Upload to {} failed: {}", client.url(), e);
                return Err(self.fail(ScanError::Upload(e.to_string())));
            }
        };

        let mut extraction = Extraction::default();
        for (field, value) in [
            (Field::PatientId, response.patient_id),
            (Field::AccessionNumber, response.accession_number),
        ] {
            let Some(value) = value else { continue };
            match validate_for(field, &value) {
                Some(valid) => match field {
                    Field::PatientId => extraction.patient_id = Some(valid),
                    Field::AccessionNumber => extraction.accession_number = Some(valid),
                },
                None => warn!("Endpoint returned malformed {}: {}", field.label(), value),
            }
            extraction.texts.push(value);
        }

        self.session.reset();
        self.continuous_done = false;
        Ok(self.apply(extraction))
    }

    /// Forget both identifiers; the next scan starts from scratch
    pub fn reset(&mut self) {
        self.session.reset();
        self.continuous_done = false;
        self.sink
            .set_both(SlotState::placeholder(READY_TEXT), SlotState::placeholder(""));
    }

    async fn extract(&self, frame: &Frame) -> ScanResult<Extraction> {
        pipeline::extract(
            self.decoder.as_ref(),
            &frame.image,
            &self.settings.hints,
            &self.settings.tiles,
        )
        .await
    }

    /// Accept candidates into empty fields, record the texts, report
    fn apply(&mut self, extraction: Extraction) -> ScanReport {
        for field in Field::ALL {
            if let Some(candidate) = extraction.candidate(field) {
                self.session.accept(field, candidate);
            }
        }

        let report = ScanReport {
            patient_id: self.session.outcome(Field::PatientId, &extraction.texts),
            accession_number: self.session.outcome(Field::AccessionNumber, &extraction.texts),
            decoded: extraction.texts.clone(),
            used_tiles: extraction.used_tiles,
        };
        self.session.record_texts(extraction.texts);
        self.sink.show_report(&report);
        report
    }

    /// Publish a failure to the reporting surface and hand it back
    fn fail(&self, error: ScanError) -> ScanError {
        match &error {
            ScanError::Decode(reason) => warn!(session = %self.session.id(), "Decode failed: {}", reason),
            other => debug!(session = %self.session.id(), "Scan aborted: {}", other),
        }
        self.sink.show_error(&error);
        error
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.as_mut() {
            stream.stop();
        }
    }
}
