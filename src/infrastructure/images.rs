//! Filesystem-backed image storage for base64 uploads

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::PathBuf;
use uuid::Uuid;

use crate::domain::{DecodedImage, DomainError, ImageStore};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Decode a `data:image/<ext>;base64,<payload>` URI.
pub fn decode_data_uri(data: &str) -> Result<DecodedImage, DomainError> {
    let invalid = |msg: &str| DomainError::validation("image", msg);

    let (header, payload) = data
        .trim()
        .split_once(";base64,")
        .ok_or_else(|| invalid("Expected a base64 data URI"))?;

    let extension = header
        .strip_prefix("data:image/")
        .ok_or_else(|| invalid("Upload a valid image"))?
        .to_ascii_lowercase();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(invalid("Unsupported image format"));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| invalid("Image payload is not valid base64"))?;

    if bytes.is_empty() {
        return Err(invalid("Image is empty"));
    }

    Ok(DecodedImage { extension, bytes })
}

/// Writes images under `<root>/recipes/` and serves them as `<base_url>/recipes/<file>`.
pub struct FsImageStore {
    root: PathBuf,
    base_url: String,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn recipes_dir(&self) -> PathBuf {
        self.root.join("recipes")
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, image: DecodedImage) -> Result<String, DomainError> {
        let dir = self.recipes_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to create media dir: {}", e)))?;

        let filename = format!("{}.{}", Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&filename), &image.bytes)
            .await
            .map_err(|e| DomainError::Internal(format!("Failed to write image: {}", e)))?;

        tracing::debug!("Stored image {} ({} bytes)", filename, image.bytes.len());
        Ok(format!("{}/recipes/{}", self.base_url, filename))
    }

    async fn remove(&self, url: &str) -> Result<(), DomainError> {
        let prefix = format!("{}/recipes/", self.base_url);
        let Some(filename) = url.strip_prefix(&prefix) else {
            return Ok(());
        };
        // Never follow a path outside the media directory
        if filename.contains('/') || filename.contains("..") {
            return Ok(());
        }

        match tokio::fs::remove_file(self.recipes_dir().join(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::Internal(format!(
                "Failed to remove image: {}",
                e
            ))),
        }
    }
}
