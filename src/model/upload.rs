use serde::{Deserialize, Serialize};

use crate::model::Id;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64UploadRequest {
    /// Raw base64, optionally prefixed with a `data:<mime>;base64,` marker
    pub image_data: String,
    pub session_id: Option<Id>,
    pub extension: Option<String>,
}

/// Outcome of an upload, returned for success and failure alike
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub image_url: Option<String>,
    pub filename: Option<String>,
    pub photo_id: Option<Id>,
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn stored(image_url: String, filename: String, photo_id: Option<Id>) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            filename: Some(filename),
            photo_id,
            error: None,
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            success: false,
            error: Some(message),
            ..Default::default()
        }
    }
}
