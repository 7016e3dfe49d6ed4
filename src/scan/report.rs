// src/scan/report.rs
// UI reporting surface: two display slots, Patient ID and Accession Number

use std::collections::HashMap;
use std::sync::Mutex;

use super::error::ScanError;
use super::types::{Field, FieldOutcome, ScanReport};

pub const READY_TEXT: &str = "-- Ready to Scan --";
pub const UPLOADING_TEXT: &str = "Uploading image...";
pub const NO_BARCODE_TEXT: &str = "No barcode found";

/// What a slot currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    /// Neutral text, no visual state
    Placeholder(String),
    /// A validated identifier, positive visual state
    Validated(String),
    /// Error or not-found message, negative visual state
    Negative(String),
}

impl SlotState {
    pub fn placeholder(text: impl Into<String>) -> Self {
        SlotState::Placeholder(text.into())
    }

    pub fn negative(text: impl Into<String>) -> Self {
        SlotState::Negative(text.into())
    }

    pub fn from_outcome(field: Field, outcome: &FieldOutcome) -> Self {
        match outcome {
            FieldOutcome::Found(value) => SlotState::Validated(value.clone()),
            FieldOutcome::NoBarcode => SlotState::negative(NO_BARCODE_TEXT),
            FieldOutcome::InvalidFormat => {
                SlotState::negative(format!("{} not found / invalid format", field.label()))
            }
        }
    }
}

pub trait ReportSink: Send + Sync {
    fn set_slot(&self, field: Field, state: SlotState);

    fn set_both(&self, patient: SlotState, accession: SlotState) {
        self.set_slot(Field::PatientId, patient);
        self.set_slot(Field::AccessionNumber, accession);
    }

    fn show_report(&self, report: &ScanReport) {
        for field in Field::ALL {
            self.set_slot(field, SlotState::from_outcome(field, report.outcome(field)));
        }
    }

    fn show_error(&self, error: &ScanError) {
        self.set_both(SlotState::negative(error.to_string()), SlotState::placeholder(""));
    }
}

/// Prints slot changes to stdout in the check-in UI's wording
#[derive(Debug, Default)]
pub struct TerminalSink;

impl ReportSink for TerminalSink {
    fn set_slot(&self, field: Field, state: SlotState) {
        match state {
            SlotState::Placeholder(text) if text.is_empty() => {}
            SlotState::Placeholder(text) => println!("   {text}"),
            SlotState::Validated(value) => println!("✅ {}: {}", field.label(), value),
            SlotState::Negative(text) => println!("❌ {}: {}", field.label(), text),
        }
    }
}

/// Keeps the latest state of each slot plus the full history
#[derive(Debug, Default)]
pub struct MemorySink {
    slots: Mutex<HashMap<Field, SlotState>>,
    history: Mutex<Vec<(Field, SlotState)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, field: Field) -> Option<SlotState> {
        self.slots.lock().ok()?.get(&field).cloned()
    }

    pub fn history(&self) -> Vec<(Field, SlotState)> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn set_slot(&self, field: Field, state: SlotState) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(field, state.clone());
        }
        if let Ok(mut history) = self.history.lock() {
            history.push((field, state));
        }
    }
}
