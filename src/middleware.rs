use crate::config::AuthConfig;
use axum::{
    extract::Request,
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use std::string::FromUtf8Error;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub async fn auth(
    Extension(config): Extension<AuthConfig>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let AuthConfig::Enabled {
        username: config_username,
        password: config_password,
    } = config
    else {
        return Ok(next.run(req).await);
    };

    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|s| s.strip_prefix("Basic "))
        .ok_or(AuthError::MissingAuth)?;

    let auth_string = String::from_utf8(base64::decode(auth_header.trim())?)?;

    let (username, password) = auth_string
        .split_once(':')
        .ok_or(AuthError::InvalidCredentials)?;

    let username_matches = username.as_bytes().ct_eq(config_username.as_bytes());
    let password_matches = password.as_bytes().ct_eq(config_password.as_bytes());

    if bool::from(username_matches & password_matches) {
        Ok(next.run(req).await)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Invalid base64 provided")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("Invalid UTF-8")]
    Utf8(#[from] FromUtf8Error),
    #[error("Auth not provided")]
    MissingAuth,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = crate::response::UploadResponse::failure(self.to_string());

        (
            StatusCode::UNAUTHORIZED,
            [(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"))],
            axum::Json(body),
        )
            .into_response()
    }
}
