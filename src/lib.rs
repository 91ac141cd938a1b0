pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod response;
pub mod storage;
pub mod validation;

use crate::{config::AuthConfig, ingest::ImageIngestor, validation::MAX_FILE_SIZE};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Extension, Router,
};
use std::{convert::Infallible, path::PathBuf, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

pub const UPLOAD_ROUTE: &str = "/api/v1/upload";

const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub struct AppOptions {
    pub ingestor: Arc<ImageIngestor>,
    pub auth: AuthConfig,
    pub cors_origins: Vec<String>,
    pub static_files: Option<(String, PathBuf)>,
}

pub fn app(options: AppOptions) -> Router {
    let AppOptions {
        ingestor,
        auth,
        cors_origins,
        static_files,
    } = options;

    let mut router = Router::new()
        .route(
            UPLOAD_ROUTE,
            post(handlers::upload)
                .layer::<_, Infallible>(axum::middleware::from_fn(middleware::auth))
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route("/health", get(handlers::health));

    if let Some((prefix, folder)) = static_files {
        let serve_dir = ServeDir::new(folder);
        router = if prefix == "/" {
            router.fallback_service(serve_dir)
        } else {
            router.nest_service(&prefix, serve_dir)
        };
    }

    router
        .layer(Extension(auth))
        .layer(Extension(ingestor))
        .layer(cors(&cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if value != "*" => Some(value),
            _ => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}
