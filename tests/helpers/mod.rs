//! Shared pieces for the router-level tests: hand-built multipart bodies, a
//! recording storage backend and a `oneshot` helper.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use marquee::{
    app,
    config::AuthConfig,
    ingest::ImageIngestor,
    storage::{StorageBackend, StorageError, StoredImageReference, ValidatedImage},
    validation::{MimePolicy, UploadRules},
    AppOptions, UPLOAD_ROUTE,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const BOUNDARY: &str = "marquee-test-boundary";

pub struct Part {
    pub name: &'static str,
    pub file_name: Option<&'static str>,
    pub content_type: Option<&'static str>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn file(name: &'static str, file_name: &'static str, content_type: &'static str) -> Self {
        Self {
            name,
            file_name: Some(file_name),
            content_type: Some(content_type),
            data: b"\x89PNG\r\n\x1a\nnot really a png".to_vec(),
        }
    }

    pub fn image(file_name: &'static str, content_type: &'static str) -> Self {
        Self::file("image", file_name, content_type)
    }

    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());

        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");

        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }

        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(parts: &[Part]) -> Request<Body> {
    Request::post(UPLOAD_ROUTE)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Keeps every image it is asked to store, or fails every call.
#[derive(Clone, Default)]
pub struct RecordingStorage {
    pub stored: Arc<Mutex<Vec<ValidatedImage>>>,
    pub fail: bool,
}

impl RecordingStorage {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageBackend for RecordingStorage {
    async fn store(&self, image: &ValidatedImage) -> Result<StoredImageReference, StorageError> {
        if self.fail {
            return Err(StorageError::Provider {
                status: 420,
                message: "quota exceeded".to_owned(),
            });
        }

        let mut stored = self.stored.lock().unwrap();
        stored.push(image.clone());

        Ok(StoredImageReference::from_url(format!(
            "https://images.test/{}/{}",
            stored.len(),
            image.original_name
        )))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn router_with(storage: Arc<dyn StorageBackend>, policy: MimePolicy, auth: AuthConfig) -> Router {
    app(AppOptions {
        ingestor: Arc::new(ImageIngestor::new(UploadRules::new(policy), storage)),
        auth,
        cors_origins: vec!["http://localhost:5173".to_owned()],
        static_files: None,
    })
}

pub fn recording_router(storage: &RecordingStorage) -> Router {
    router_with(
        Arc::new(storage.clone()),
        MimePolicy::ImagePrefix,
        AuthConfig::Disabled,
    )
}
