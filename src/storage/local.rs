use super::{StorageBackend, StorageError, StoredImageReference, ValidatedImage};
use async_trait::async_trait;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{info, trace};

const SUFFIX_LENGTH: usize = 6;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    folder: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(folder: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        // Kept without a trailing slash; the root prefix is empty.
        let public_prefix: String = public_prefix.into();
        let public_prefix = match public_prefix.trim_matches('/') {
            "" => String::new(),
            trimmed => format!("/{trimmed}"),
        };

        Self {
            folder: folder.into(),
            public_prefix,
        }
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn store(&self, image: &ValidatedImage) -> Result<StoredImageReference, StorageError> {
        fs::create_dir_all(&self.folder).await?;

        let (file_name, mut file) = create_unique(&self.folder, || {
            generate_filename(&image.field_name, &image.extension)
        })
        .await?;

        file.write_all(&image.data).await?;
        file.sync_all().await?;

        info!(
            file_name = %file_name,
            original_name = %image.original_name,
            size_bytes = image.data.len(),
            "Stored image on local disk"
        );

        let format = infer::get(&image.data)
            .map(|kind| kind.extension().to_owned())
            .unwrap_or_else(|| image.extension.clone());

        Ok(StoredImageReference {
            format: Some(format),
            ..StoredImageReference::from_url(format!("{}/{file_name}", self.public_prefix))
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

async fn create_unique(
    folder: &Path,
    mut next_name: impl FnMut() -> String,
) -> Result<(String, File), StorageError> {
    loop {
        let file_name = next_name();
        let path = folder.join(&file_name);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => break Ok((file_name, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                trace!("File {file_name} already exists, regenerating");
            }
            Err(err) => break Err(err.into()),
        }
    }
}

fn generate_filename(field_name: &str, extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();

    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LENGTH)
        .map(char::from)
        .collect();

    format!("{field_name}-{millis}-{suffix}.{extension}")
}
