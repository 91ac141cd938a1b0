use crate::storage::StoredImageReference;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl UploadResponse {
    pub fn success(reference: StoredImageReference) -> Self {
        Self {
            success: true,
            message: "Image uploaded successfully".to_owned(),
            image_url: Some(reference.url),
            public_id: reference.public_id,
            format: reference.format,
            width: reference.width,
            height: reference.height,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            image_url: None,
            public_id: None,
            format: None,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub storage: &'static str,
}
