// src/scan/session.rs
// Per-activation scan state. Only the controller mutates it.

use tracing::{debug, info};
use uuid::Uuid;

use super::types::{CameraState, Field, FieldOutcome};

#[derive(Debug, Clone)]
pub struct ScanSession {
    id: Uuid,
    camera_state: CameraState,
    found_patient_id: Option<String>,
    found_accession_number: Option<String>,
    last_scan_texts: Vec<String>,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            camera_state: CameraState::Uninitialized,
            found_patient_id: None,
            found_accession_number: None,
            last_scan_texts: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera_state
    }

    pub fn found(&self, field: Field) -> Option<&str> {
        match field {
            Field::PatientId => self.found_patient_id.as_deref(),
            Field::AccessionNumber => self.found_accession_number.as_deref(),
        }
    }

    pub fn found_patient_id(&self) -> Option<&str> {
        self.found_patient_id.as_deref()
    }

    pub fn found_accession_number(&self) -> Option<&str> {
        self.found_accession_number.as_deref()
    }

    pub fn last_scan_texts(&self) -> &[String] {
        &self.last_scan_texts
    }

    pub fn is_complete(&self) -> bool {
        self.found_patient_id.is_some() && self.found_accession_number.is_some()
    }

    /// Uninitialized/Failed -> Starting. Returns false for any other state.
    pub(crate) fn begin_camera_start(&mut self) -> bool {
        match self.camera_state {
            CameraState::Uninitialized | CameraState::Failed => {
                self.camera_state = CameraState::Starting;
                true
            }
            CameraState::Starting | CameraState::Ready => false,
        }
    }

    /// Starting -> Ready or Failed
    pub(crate) fn finish_camera_start(&mut self, ok: bool) {
        debug_assert_eq!(self.camera_state, CameraState::Starting);
        self.camera_state = if ok { CameraState::Ready } else { CameraState::Failed };
    }

    pub(crate) fn camera_released(&mut self) {
        self.camera_state = CameraState::Uninitialized;
    }

    pub(crate) fn record_texts(&mut self, texts: Vec<String>) {
        self.last_scan_texts = texts;
    }

    /// Accept `value` only if the field is still empty. Returns whether it was taken.
    pub(crate) fn accept(&mut self, field: Field, value: &str) -> bool {
        let slot = match field {
            Field::PatientId => &mut self.found_patient_id,
            Field::AccessionNumber => &mut self.found_accession_number,
        };
        if let Some(held) = slot.as_deref() {
            if held != value {
                debug!("Keeping {} {}, ignoring later read {}", field.label(), held, value);
            }
            return false;
        }
        info!(session = %self.id, "{} accepted: {}", field.label(), value);
        *slot = Some(value.to_string());
        true
    }

    /// Forget both identifiers and the last decode
    pub fn reset(&mut self) {
        self.found_patient_id = None;
        self.found_accession_number = None;
        self.last_scan_texts.clear();
    }

    /// Field outcome after a pass that decoded `texts`
    pub(crate) fn outcome(&self, field: Field, texts: &[String]) -> FieldOutcome {
        match self.found(field) {
            Some(value) => FieldOutcome::Found(value.to_string()),
            None if texts.is_empty() => FieldOutcome::NoBarcode,
            None => FieldOutcome::InvalidFormat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_acceptance_wins() {
        let mut session = ScanSession::new();
        assert!(session.accept(Field::PatientId, "A123456"));
        assert!(!session.accept(Field::PatientId, "B7654321"));
        assert_eq!(session.found_patient_id(), Some("A123456"));

        session.reset();
        assert_eq!(session.found_patient_id(), None);
        assert!(session.accept(Field::PatientId, "B7654321"));
    }

    #[test]
    fn test_camera_state_transitions() {
        let mut session = ScanSession::new();
        assert_eq!(session.camera_state(), CameraState::Uninitialized);

        assert!(session.begin_camera_start());
        assert!(!session.begin_camera_start());
        session.finish_camera_start(false);
        assert_eq!(session.camera_state(), CameraState::Failed);

        // retry from Failed
        assert!(session.begin_camera_start());
        session.finish_camera_start(true);
        assert_eq!(session.camera_state(), CameraState::Ready);
        assert!(!session.begin_camera_start());
    }

    #[test]
    fn test_outcome_distinguishes_empty_from_mismatch() {
        let session = ScanSession::new();
        assert_eq!(session.outcome(Field::PatientId, &[]), FieldOutcome::NoBarcode);
        assert_eq!(
            session.outcome(Field::PatientId, &["XYZ999".to_string()]),
            FieldOutcome::InvalidFormat
        );
    }
}
