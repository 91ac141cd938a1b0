use crate::{
    error::Error,
    storage::{StorageBackend, StoredImageReference, ValidatedImage},
    validation::{Rejection, UploadRules, ValidationError, FIELD_NAME},
};
use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};
use bytes::BytesMut;
use std::sync::Arc;
use tracing::{debug, info, trace};

pub struct ImageIngestor {
    rules: UploadRules,
    storage: Arc<dyn StorageBackend>,
}

impl ImageIngestor {
    pub fn new(rules: UploadRules, storage: Arc<dyn StorageBackend>) -> Self {
        Self { rules, storage }
    }

    pub fn storage_name(&self) -> &'static str {
        self.storage.name()
    }

    pub async fn ingest(&self, multipart: Multipart) -> Result<StoredImageReference, Error> {
        let image = self.read_image(multipart).await?;

        debug!(
            original_name = %image.original_name,
            size_bytes = image.data.len(),
            backend = self.storage.name(),
            "Image passed validation"
        );

        let reference = self.storage.store(&image).await?;
        info!(url = %reference.url, "Image uploaded");

        Ok(reference)
    }

    async fn read_image(&self, mut multipart: Multipart) -> Result<ValidatedImage, Error> {
        let mut image: Option<ValidatedImage> = None;

        while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_owned();
            let original_name = field.file_name().map(str::to_owned);

            if image.is_some() && (original_name.is_some() || name == FIELD_NAME) {
                return Err(ValidationError::TooManyFiles.into());
            }

            if name != FIELD_NAME {
                if original_name.is_some() {
                    return Err(ValidationError::UnexpectedField(name).into());
                }
                trace!(field = %name, "Skipping non-file field");
                continue;
            }

            let original_name = original_name.unwrap_or_default();
            let extension = self.rules.check_extension(&original_name)?;
            let content_type = field.content_type().map(str::to_owned);
            self.rules.check_content_type(content_type.as_deref())?;

            let mut data = BytesMut::new();
            while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
                self.rules.check_size(data.len() + chunk.len())?;
                data.extend_from_slice(&chunk);
            }

            if data.is_empty() {
                return Err(Rejection::Empty.into());
            }

            image = Some(ValidatedImage {
                field_name: name,
                original_name,
                extension,
                content_type: content_type.unwrap_or_default(),
                data: data.freeze(),
            });
        }

        image.ok_or_else(|| ValidationError::MissingFile.into())
    }
}

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Rejection::TooLarge.into()
    } else {
        ValidationError::Malformed(err.body_text()).into()
    }
}
