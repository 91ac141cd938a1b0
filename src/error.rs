use crate::{
    response::UploadResponse,
    storage::StorageError,
    validation::{Rejection, ValidationError},
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

pub const STORAGE_FAILURE_MESSAGE: &str = "Server error during image upload";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        Error::Validation(rejection.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            Error::Validation(ValidationError::InvalidFile(Rejection::TooLarge)) => {
                (StatusCode::PAYLOAD_TOO_LARGE, self.to_string())
            }
            Error::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                STORAGE_FAILURE_MESSAGE.to_owned(),
            ),
        };

        if code.is_server_error() {
            error!("Image upload failed: {self}");
        } else {
            warn!("Rejected image upload: {self}");
        }

        (code, Json(UploadResponse::failure(message))).into_response()
    }
}
