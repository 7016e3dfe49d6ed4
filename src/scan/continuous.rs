// src/scan/continuous.rs
// Continuous scanning as a cancellable stream of decode events

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::controller::ScanController;
use super::error::ScanError;
use super::types::ScanReport;

/// Events emitted while the loop runs, in frame order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A frame was decoded and classified
    Frame { sequence: u64, report: ScanReport },
    /// Capture or decode failed for one frame; the loop keeps going
    Error { sequence: Option<u64>, error: ScanError },
    /// Both identifiers are held; the loop has stopped
    Completed {
        patient_id: String,
        accession_number: String,
    },
    /// Stopped from outside before completion
    Cancelled,
    /// Camera not usable; the loop has stopped
    Stopped { error: ScanError },
}

/// Handle to a running continuous scan
pub struct ContinuousScan {
    token: CancellationToken,
    handle: JoinHandle<ScanController>,
}

impl ContinuousScan {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the loop to stop and take the controller back
    pub async fn join(self) -> Result<ScanController, JoinError> {
        self.handle.await
    }
}

/// Move `controller` into a background task that scans a frame per tick
/// until both identifiers are found or the token is cancelled.
pub fn spawn_continuous(
    controller: ScanController,
    interval: Duration,
) -> (ContinuousScan, ReceiverStream<ScanEvent>) {
    let token = CancellationToken::new();
    let (tx, rx) = mpsc::channel(32);

    let loop_token = token.clone();
    let handle = tokio::spawn(async move {
        let mut controller = controller;
        controller.run_continuous(interval, loop_token, tx).await;
        controller
    });

    (ContinuousScan { token, handle }, ReceiverStream::new(rx))
}

impl ScanController {
    fn completed_event(&self) -> ScanEvent {
        let session = self.session();
        ScanEvent::Completed {
            patient_id: session.found_patient_id().unwrap_or_default().to_string(),
            accession_number: session.found_accession_number().unwrap_or_default().to_string(),
        }
    }

    /// Drive the continuous loop on the current task. Ticks that elapse
    /// while a decode is still running are skipped, not queued.
    pub async fn run_continuous(
        &mut self,
        interval: Duration,
        token: CancellationToken,
        events: mpsc::Sender<ScanEvent>,
    ) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(session = %self.session().id(), "Continuous scan started ({:?} per frame)", interval);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Continuous scan cancelled");
                    let _ = events.send(ScanEvent::Cancelled).await;
                    break;
                }
                _ = ticker.tick() => {}
            }

            let frame = match self.capture_frame().await {
                Ok(frame) => frame,
                Err(error @ (ScanError::NotReady | ScanError::CameraUnavailable(_)))
                    if !self.is_ready() =>
                {
                    let _ = events.send(ScanEvent::Stopped { error }).await;
                    break;
                }
                Err(error) => {
                    if events.send(ScanEvent::Error { sequence: None, error }).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            let sequence = frame.sequence;
            let event = match self.scan_frame(&frame).await {
                Ok(Some(report)) => ScanEvent::Frame { sequence, report },
                Ok(None) => {
                    // both identifiers were already held when the loop started
                    let _ = events.send(self.completed_event()).await;
                    token.cancel();
                    break;
                }
                Err(error) => ScanEvent::Error {
                    sequence: Some(sequence),
                    error,
                },
            };
            if events.send(event).await.is_err() {
                debug!("Event receiver dropped, stopping continuous scan");
                token.cancel();
                break;
            }

            if self.is_continuous_done() {
                let _ = events.send(self.completed_event()).await;
                token.cancel();
                break;
            }
        }
    }
}
