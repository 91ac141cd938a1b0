use crate::validation::MimePolicy;
use anyhow::{anyhow, bail};
use envconfig::Envconfig;
use std::{path::PathBuf, time::Duration};

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "LISTEN_ADDRESS", default = "0.0.0.0:3000")]
    pub listen_address: String,

    #[envconfig(from = "STORAGE_BACKEND", default = "local")]
    pub storage_backend: String,

    #[envconfig(from = "UPLOADS_FOLDER", default = "./uploads")]
    pub uploads_folder: String,

    #[envconfig(from = "UPLOADS_PUBLIC_PREFIX", default = "/uploads")]
    pub uploads_public_prefix: String,

    #[envconfig(from = "MIME_POLICY", default = "prefix")]
    pub mime_policy: String,

    #[envconfig(from = "CLOUDINARY_CLOUD_NAME", default = "")]
    pub cloudinary_cloud_name: String,

    #[envconfig(from = "CLOUDINARY_API_KEY", default = "")]
    pub cloudinary_api_key: String,

    #[envconfig(from = "CLOUDINARY_API_SECRET", default = "")]
    pub cloudinary_api_secret: String,

    #[envconfig(from = "CLOUDINARY_FOLDER", default = "uploads")]
    pub cloudinary_folder: String,

    #[envconfig(from = "CLOUDINARY_API_BASE", default = "https://api.cloudinary.com")]
    pub cloudinary_api_base: String,

    #[envconfig(from = "CLOUDINARY_TIMEOUT_SECS", default = "30")]
    pub cloudinary_timeout_secs: u64,

    #[envconfig(from = "CORS_ALLOWED_ORIGINS", default = "http://localhost:5173")]
    pub cors_allowed_origins: String,

    #[envconfig(from = "BASIC_AUTH_USERNAME", default = "")]
    pub basic_auth_username: String,

    #[envconfig(from = "BASIC_AUTH_PASSWORD", default = "")]
    pub basic_auth_password: String,

    #[envconfig(from = "ENABLE_AUTH", default = "false")]
    pub enable_auth: bool,
}

impl Config {
    pub fn storage_config(&self) -> anyhow::Result<StorageConfig> {
        match self.storage_backend.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageConfig::Local {
                folder: PathBuf::from(&self.uploads_folder),
                public_prefix: format!("/{}", self.uploads_public_prefix.trim_matches('/')),
            }),
            "cloudinary" => {
                let missing: Vec<&str> = [
                    ("CLOUDINARY_CLOUD_NAME", &self.cloudinary_cloud_name),
                    ("CLOUDINARY_API_KEY", &self.cloudinary_api_key),
                    ("CLOUDINARY_API_SECRET", &self.cloudinary_api_secret),
                ]
                .into_iter()
                .filter(|(_, value)| value.trim().is_empty())
                .map(|(name, _)| name)
                .collect();

                if !missing.is_empty() {
                    bail!("Missing Cloudinary configuration: {}", missing.join(", "));
                }

                Ok(StorageConfig::Cloudinary(CloudinaryConfig {
                    cloud_name: self.cloudinary_cloud_name.trim().to_owned(),
                    api_key: self.cloudinary_api_key.trim().to_owned(),
                    api_secret: self.cloudinary_api_secret.trim().to_owned(),
                    folder: self.cloudinary_folder.clone(),
                    api_base: self.cloudinary_api_base.trim_end_matches('/').to_owned(),
                    timeout: Duration::from_secs(self.cloudinary_timeout_secs),
                }))
            }
            other => Err(anyhow!(
                "Unknown STORAGE_BACKEND {other:?}, expected \"local\" or \"cloudinary\""
            )),
        }
    }

    pub fn mime_policy(&self) -> anyhow::Result<MimePolicy> {
        match self.mime_policy.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(MimePolicy::ImagePrefix),
            "strict" => Ok(MimePolicy::Strict),
            other => Err(anyhow!(
                "Unknown MIME_POLICY {other:?}, expected \"prefix\" or \"strict\""
            )),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        if self.enable_auth {
            AuthConfig::Enabled {
                username: self.basic_auth_username.clone(),
                password: self.basic_auth_password.clone(),
            }
        } else {
            AuthConfig::Disabled
        }
    }

    pub fn cors_origins(&self) -> anyhow::Result<Vec<String>> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();

        if origins.iter().any(|origin| origin == "*") {
            bail!("CORS_ALLOWED_ORIGINS cannot contain \"*\": credentialed CORS needs explicit origins");
        }

        Ok(origins)
    }
}

#[derive(Debug, Clone)]
pub enum StorageConfig {
    Local {
        folder: PathBuf,
        public_prefix: String,
    },
    Cloudinary(CloudinaryConfig),
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum AuthConfig {
    Enabled { username: String, password: String },
    Disabled,
}
