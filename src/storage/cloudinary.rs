use super::{StorageBackend, StorageError, StoredImageReference, ValidatedImage};
use crate::config::CloudinaryConfig;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub struct CloudinaryStorage {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    secure_url: String,
    public_id: Option<String>,
    format: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base, self.config.cloud_name
        )
    }

    fn form(&self, image: &ValidatedImage, timestamp: u64) -> Result<Form, StorageError> {
        let timestamp = timestamp.to_string();
        let params = [
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
            ("unique_filename", "true"),
            ("use_filename", "true"),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let file = Part::stream_with_length(image.data.clone(), image.data.len() as u64)
            .file_name(image.original_name.clone())
            .mime_str(&image.content_type)?;

        let form = params
            .iter()
            .fold(Form::new().part("file", file), |form, (key, value)| {
                form.text(key.to_string(), value.to_string())
            })
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        Ok(form)
    }
}

#[async_trait]
impl StorageBackend for CloudinaryStorage {
    async fn store(&self, image: &ValidatedImage) -> Result<StoredImageReference, StorageError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();

        let url = self.upload_url();
        debug!(%url, folder = %self.config.folder, "Uploading image to Cloudinary");

        let response = self
            .client
            .post(&url)
            .multipart(self.form(image, timestamp)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|body| body.error.message)
                .unwrap_or(body);

            return Err(StorageError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let result: UploadResult = response
            .json()
            .await
            .map_err(|err| StorageError::InvalidResponse(err.to_string()))?;

        if result.secure_url.is_empty() {
            return Err(StorageError::InvalidResponse(
                "secure_url is empty".to_owned(),
            ));
        }

        info!(
            public_id = ?result.public_id,
            size_bytes = image.data.len(),
            "Stored image on Cloudinary"
        );

        Ok(StoredImageReference {
            url: result.secure_url,
            public_id: result.public_id,
            format: result.format,
            width: result.width,
            height: result.height,
        })
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
