// src/scan/types.rs
// Value types shared by the scan workflow, the decoder seam and the upload API

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Barcode symbologies the check-in labels are printed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    Code128,
    Code39,
    QrCode,
    DataMatrix,
}

impl BarcodeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Code128 => "code128",
            BarcodeFormat::Code39 => "code39",
            BarcodeFormat::QrCode => "qr_code",
            BarcodeFormat::DataMatrix => "data_matrix",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of formats the decoder is asked to look for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatHints(BTreeSet<BarcodeFormat>);

impl FormatHints {
    pub fn new(formats: impl IntoIterator<Item = BarcodeFormat>) -> Self {
        Self(formats.into_iter().collect())
    }

    pub fn contains(&self, format: BarcodeFormat) -> bool {
        self.0.contains(&format)
    }

    pub fn iter(&self) -> impl Iterator<Item = BarcodeFormat> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FormatHints {
    /// Code128, Code39, QR and DataMatrix
    fn default() -> Self {
        Self::new([
            BarcodeFormat::Code128,
            BarcodeFormat::Code39,
            BarcodeFormat::QrCode,
            BarcodeFormat::DataMatrix,
        ])
    }
}

/// One decoded symbol as reported by the decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub format: BarcodeFormat,
}

impl DecodedText {
    pub fn new(text: impl Into<String>, format: BarcodeFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }
}

/// Camera facing preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear-facing camera
    #[default]
    Environment,
    /// Front-facing camera
    User,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            other => Err(format!("unknown facing mode '{other}'")),
        }
    }
}

/// Lifecycle of one camera acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Uninitialized,
    Starting,
    Ready,
    Failed,
}

/// The two record identifiers a check-in label carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PatientId,
    AccessionNumber,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::PatientId, Field::AccessionNumber];

    /// Label used by the reporting surface
    pub fn label(&self) -> &'static str {
        match self {
            Field::PatientId => "Patient ID",
            Field::AccessionNumber => "Accession #",
        }
    }
}

/// Per-field result of one scan pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Validated value held by the session
    Found(String),
    /// Nothing was decoded in the frame at all
    NoBarcode,
    /// Barcodes decoded, none matched this field's pattern
    InvalidFormat,
}

impl FieldOutcome {
    pub fn value(&self) -> Option<&str> {
        match self {
            FieldOutcome::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FieldOutcome::Found(_))
    }
}

/// Summary of a single scan invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub patient_id: FieldOutcome,
    pub accession_number: FieldOutcome,
    /// Distinct raw texts from this pass, in decode order
    pub decoded: Vec<String>,
    /// Whether the multi-tile fallback produced the texts
    pub used_tiles: bool,
}

impl ScanReport {
    pub fn outcome(&self, field: Field) -> &FieldOutcome {
        match field {
            Field::PatientId => &self.patient_id,
            Field::AccessionNumber => &self.accession_number,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.patient_id.is_found() && self.accession_number.is_found()
    }
}
