use crate::{
    error::Error,
    ingest::ImageIngestor,
    response::{HealthResponse, UploadResponse},
    validation::{Rejection, ValidationError},
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

pub async fn upload(
    Extension(ingestor): Extension<Arc<ImageIngestor>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, Error> {
    let multipart = multipart.map_err(|err| match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => Error::from(Rejection::TooLarge),
        _ => ValidationError::Malformed(err.body_text()).into(),
    })?;
    let reference = ingestor.ingest(multipart).await?;

    Ok(Json(UploadResponse::success(reference)))
}

pub async fn health(Extension(ingestor): Extension<Arc<ImageIngestor>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "ok",
        storage: ingestor.storage_name(),
    })
}
