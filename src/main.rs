use anyhow::Context;
use envconfig::Envconfig;
use marquee::{
    app,
    config::{Config, StorageConfig},
    ingest::ImageIngestor,
    storage,
    validation::UploadRules,
    AppOptions,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("Failed to read .env file");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::init_from_env().context("Failed to load config")?;

    let storage_config = config
        .storage_config()
        .context("Invalid storage configuration")?;
    let rules = UploadRules::new(config.mime_policy()?);

    let static_files = match &storage_config {
        StorageConfig::Local {
            folder,
            public_prefix,
        } => {
            tokio::fs::create_dir_all(folder)
                .await
                .with_context(|| format!("Could not create uploads folder {folder:?}"))?;
            Some((public_prefix.clone(), folder.clone()))
        }
        StorageConfig::Cloudinary(_) => None,
    };

    let backend =
        storage::from_config(storage_config).context("Could not initialize storage backend")?;
    info!("Using {} storage, MIME policy {:?}", backend.name(), rules.mime_policy);

    let app = app(AppOptions {
        ingestor: Arc::new(ImageIngestor::new(rules, backend)),
        auth: config.auth_config(),
        cors_origins: config.cors_origins()?,
        static_files,
    });

    let listener = TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("Could not bind to {}", config.listen_address))?;

    info!("Listening on {}", config.listen_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
