//! Upload ingestion: decode a payload, publish it under a generated name in
//! the upload directory, then optionally register it as a photo.
//!
//! The file write and the photo insert are separate resources. When the
//! insert fails after the write, the file stays on disk and the caller gets
//! `UploadError::Link` naming it; nothing is rolled back.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::logic::error::ServiceError;
use crate::logic::photos::PhotoService;
use crate::model::{Id, PhotoResponse, UploadResponse};
use crate::store::traits::Store;

pub const DEFAULT_EXTENSION: &str = "png";
const MAX_EXTENSION_LENGTH: usize = 16;

/// Standard alphabet; trailing `=` padding may be present or omitted
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to save file: {0}")]
    StorageFault(#[from] std::io::Error),

    #[error("File saved as {image_url} but the photo record could not be created: {source}")]
    Link {
        image_url: String,
        filename: String,
        #[source]
        source: ServiceError,
    },
}

/// Where uploads land on disk and the URL prefix they are served under
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub public_prefix: String,
}

impl UploadConfig {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into(),
        }
    }

    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), filename)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new("uploads/photos", "/uploads/photos")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredUpload {
    pub image_url: String,
    pub filename: String,
    pub path: PathBuf,
    pub photo: Option<PhotoResponse>,
}

impl From<StoredUpload> for UploadResponse {
    fn from(upload: StoredUpload) -> Self {
        UploadResponse::stored(
            upload.image_url,
            upload.filename,
            upload.photo.map(|photo| photo.id),
        )
    }
}

pub struct UploadPipeline<S> {
    config: UploadConfig,
    photos: PhotoService<S>,
}

impl<S> Clone for UploadPipeline<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            photos: self.photos.clone(),
        }
    }
}

impl<S: Store> UploadPipeline<S> {
    pub fn new(config: UploadConfig, photos: PhotoService<S>) -> Self {
        Self { config, photos }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Ingest base64 text, with or without a `data:<mime>;base64,` prefix
    pub async fn ingest_base64(
        &self,
        image_data: &str,
        extension: Option<&str>,
        session_id: Option<Id>,
    ) -> Result<StoredUpload, UploadError> {
        let bytes = decode_base64_payload(image_data)?;
        let extension = normalize_extension(extension)?;
        self.store_and_link(&bytes, &extension, session_id).await
    }

    /// Ingest a multipart file body. Empty bodies are rejected before any
    /// filesystem access.
    pub async fn ingest_file(
        &self,
        bytes: &[u8],
        original_filename: Option<&str>,
        session_id: Option<Id>,
    ) -> Result<StoredUpload, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::InvalidInput("File is empty".to_string()));
        }

        let extension = normalize_extension(extension_from_filename(original_filename))?;
        self.store_and_link(bytes, &extension, session_id).await
    }

    async fn store_and_link(
        &self,
        bytes: &[u8],
        extension: &str,
        session_id: Option<Id>,
    ) -> Result<StoredUpload, UploadError> {
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.write_file(&filename, bytes).await?;
        let image_url = self.config.public_url(&filename);
        log::info!("Stored upload {} ({} bytes)", filename, bytes.len());

        let photo = match session_id {
            Some(session_id) => {
                match self
                    .photos
                    .create_photo_from_upload(session_id, &image_url)
                    .await
                {
                    Ok(photo) => Some(photo),
                    Err(source) => {
                        log::warn!(
                            "Upload {} left on disk without a photo record: {}",
                            path.display(),
                            source
                        );
                        return Err(UploadError::Link {
                            image_url,
                            filename,
                            source,
                        });
                    }
                }
            }
            None => None,
        };

        Ok(StoredUpload {
            image_url,
            filename,
            path,
            photo,
        })
    }

    /// Write to a hidden temp file next to the target, then rename into place
    async fn write_file(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.config.dir).await?;

        let final_path = self.config.dir.join(filename);
        let temp_path = self.config.dir.join(format!(".{}.tmp", filename));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &final_path).await
        }
        .await;

        if let Err(e) = written {
            log::error!("Failed to write upload {}: {}", final_path.display(), e);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        Ok(final_path)
    }
}

/// Drop everything up to and including the first comma, then decode
pub fn decode_base64_payload(image_data: &str) -> Result<Vec<u8>, UploadError> {
    let encoded = match image_data.split_once(',') {
        Some((_, rest)) => rest,
        None => image_data,
    };

    PAYLOAD_ENGINE
        .decode(encoded.trim())
        .map_err(|e| UploadError::InvalidInput(format!("Invalid base64 data: {}", e)))
}

/// Suffix after the last dot of the file's base name, if any
pub fn extension_from_filename(original_filename: Option<&str>) -> Option<&str> {
    let name = original_filename?;
    let base = Path::new(name)
        .file_name()
        .and_then(|base| base.to_str())
        .unwrap_or(name);
    base.rsplit_once('.').map(|(_, extension)| extension)
}

/// Missing or blank extensions fall back to `png`; anything that is not a
/// short alphanumeric token is rejected so generated names stay inside the
/// upload directory.
pub fn normalize_extension(extension: Option<&str>) -> Result<String, UploadError> {
    let extension = extension
        .map(|ext| ext.trim().trim_start_matches('.'))
        .unwrap_or_default();

    if extension.is_empty() {
        return Ok(DEFAULT_EXTENSION.to_string());
    }

    if extension.len() > MAX_EXTENSION_LENGTH
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(UploadError::InvalidInput(format!(
            "Unsupported file extension: {}",
            extension
        )));
    }

    Ok(extension.to_string())
}
