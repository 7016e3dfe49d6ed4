// src/api/types.rs
// Upload endpoint wire types, shared by the server and the client

use serde::{Deserialize, Serialize};

/// Body of `POST /upload`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    /// `data:image/jpeg;base64,...` or bare base64
    #[serde(default)]
    pub image: Option<String>,
}

/// Identifiers found in the uploaded frame. A missing or null key means not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub accession_number: Option<String>,
}
