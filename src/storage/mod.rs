pub mod cloudinary;
pub mod local;

pub use cloudinary::CloudinaryStorage;
pub use local::LocalStorage;

use crate::config::StorageConfig;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub field_name: String,
    pub original_name: String,
    pub extension: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImageReference {
    pub url: String,
    pub public_id: Option<String>,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl StoredImageReference {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: None,
            format: None,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Provider rejected upload ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("Provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider returned an unusable response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn store(&self, image: &ValidatedImage) -> Result<StoredImageReference, StorageError>;

    fn name(&self) -> &'static str;
}

pub fn from_config(config: StorageConfig) -> Result<Arc<dyn StorageBackend>, StorageError> {
    let backend: Arc<dyn StorageBackend> = match config {
        StorageConfig::Local {
            folder,
            public_prefix,
        } => Arc::new(LocalStorage::new(folder, public_prefix)),
        StorageConfig::Cloudinary(cloudinary) => Arc::new(CloudinaryStorage::new(cloudinary)?),
    };

    Ok(backend)
}
