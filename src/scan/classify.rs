// src/scan/classify.rs
// Identifier patterns for decoded barcode text

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::Field;

/// Leading letter, 6-7 digits, optional trailing check character
static PATIENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][0-9]{6,7}[A-Z0-9]?$").expect("patient id pattern"));

/// "PWH", 9 digits, one letter
static ACCESSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PWH[0-9]{9}[A-Z]$").expect("accession pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    PatientId,
    AccessionNumber,
    Unclassified,
}

impl Classification {
    pub fn field(&self) -> Option<Field> {
        match self {
            Classification::PatientId => Some(Field::PatientId),
            Classification::AccessionNumber => Some(Field::AccessionNumber),
            Classification::Unclassified => None,
        }
    }
}

/// Uppercase form that classification and session storage use
pub fn normalize(text: &str) -> String {
    text.to_uppercase()
}

/// Classify raw decoded text. Matching is case-insensitive; the patient ID
/// pattern is tried first and a string never lands in both buckets.
pub fn classify(text: &str) -> Classification {
    let upper = normalize(text);
    if PATIENT_ID_RE.is_match(&upper) {
        Classification::PatientId
    } else if ACCESSION_RE.is_match(&upper) {
        Classification::AccessionNumber
    } else {
        Classification::Unclassified
    }
}

pub fn is_patient_id(text: &str) -> bool {
    PATIENT_ID_RE.is_match(&normalize(text))
}

pub fn is_accession_number(text: &str) -> bool {
    ACCESSION_RE.is_match(&normalize(text))
}

/// Normalized value if `text` is a valid identifier for `field`
pub fn validate_for(field: Field, text: &str) -> Option<String> {
    let upper = normalize(text);
    let ok = match field {
        Field::PatientId => PATIENT_ID_RE.is_match(&upper),
        Field::AccessionNumber => ACCESSION_RE.is_match(&upper),
    };
    ok.then_some(upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_shapes() {
        assert_eq!(classify("A123456"), Classification::PatientId);
        assert_eq!(classify("A1234567"), Classification::PatientId);
        assert_eq!(classify("A1234567X"), Classification::PatientId);
        assert_eq!(classify("A1234569"), Classification::PatientId);
        assert_eq!(classify("a123456b"), Classification::PatientId);

        assert_eq!(classify("A12345"), Classification::Unclassified);
        assert_eq!(classify("A123456789"), Classification::Unclassified);
        assert_eq!(classify("1234567"), Classification::Unclassified);
        assert_eq!(classify("A123456-"), Classification::Unclassified);
        assert_eq!(classify(" A123456"), Classification::Unclassified);
    }

    #[test]
    fn test_accession_shapes() {
        assert_eq!(classify("PWH123456789X"), Classification::AccessionNumber);
        assert_eq!(classify("pwh123456789x"), Classification::AccessionNumber);

        assert_eq!(classify("PWH12345678X"), Classification::Unclassified);
        assert_eq!(classify("PWH1234567890X"), Classification::Unclassified);
        assert_eq!(classify("PWH1234567890"), Classification::Unclassified);
        assert_eq!(classify("PWX123456789X"), Classification::Unclassified);
    }

    #[test]
    fn test_unclassified_inputs() {
        for text in ["", "XYZ999", "HELLO WORLD", "P", "PWH"] {
            assert_eq!(classify(text), Classification::Unclassified, "{text:?}");
        }
    }

    #[test]
    fn test_patterns_never_overlap() {
        // Every accession number has a letter in position 1, every patient ID a digit.
        let prefixes = ["A", "P", "PW", "PWH", "Z", "pwh"];
        let bodies = ["123456", "1234567", "123456789", "12345678"];
        let suffixes = ["", "X", "0", "XX", "9X"];

        let mut checked = 0;
        for prefix in prefixes {
            for body in bodies {
                for suffix in suffixes {
                    let candidate = format!("{prefix}{body}{suffix}");
                    assert!(
                        !(is_patient_id(&candidate) && is_accession_number(&candidate)),
                        "{candidate} matched both patterns"
                    );
                    checked += 1;
                }
            }
        }
        assert_eq!(checked, prefixes.len() * bodies.len() * suffixes.len());
    }

    #[test]
    fn test_validate_for_normalizes() {
        assert_eq!(validate_for(Field::PatientId, "b7654321"), Some("B7654321".to_string()));
        assert_eq!(validate_for(Field::AccessionNumber, "b7654321"), None);
        assert_eq!(
            validate_for(Field::AccessionNumber, "pwh000000001a"),
            Some("PWH000000001A".to_string())
        );
    }

    #[test]
    fn test_classification_field_mapping() {
        assert_eq!(Classification::PatientId.field(), Some(Field::PatientId));
        assert_eq!(Classification::AccessionNumber.field(), Some(Field::AccessionNumber));
        assert_eq!(Classification::Unclassified.field(), None);
    }
}
