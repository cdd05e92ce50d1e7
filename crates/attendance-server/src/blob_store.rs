//! Filesystem blob store for transaction photos.
//!
//! Photos are written as `<uuid><.ext>` under the upload directory. The
//! reference persisted on a transaction is `uploads/<file name>`, which is
//! also the path they are served from.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use attendance_shared::constants::UPLOAD_DIR;

use crate::error::ServerError;

/// Verify that `name` is a single plain file name inside `base`.
/// Prevents path traversal attacks.
fn ensure_within(base: &Path, name: &str) -> Result<PathBuf, ServerError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(file)), None) if !name.contains('\\') => Ok(base.join(file)),
        _ => Err(ServerError::BadRequest("Path traversal detected".to_string())),
    }
}

/// Keep the original extension only when it is short and alphanumeric.
fn sanitized_extension(original_filename: Option<&str>) -> String {
    original_filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Map common image extensions to MIME types.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct PhotoStore {
    base_path: PathBuf,
    max_size: usize,
}

impl PhotoStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::BlobStorage(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Photo store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Reject sizes the store would refuse, before anything is written.
    pub fn check_size(&self, size: usize) -> Result<(), ServerError> {
        if size > self.max_size {
            return Err(ServerError::PayloadTooLarge {
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    /// Persist `data` and return the reference to store on the transaction.
    pub async fn store_photo(
        &self,
        data: &[u8],
        original_filename: Option<&str>,
    ) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty photo".to_string()));
        }
        self.check_size(data.len())?;

        let file_name = format!("{}{}", Uuid::new_v4(), sanitized_extension(original_filename));
        let path = ensure_within(&self.base_path, &file_name)?;

        fs::write(&path, data).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to write photo {}: {}", file_name, e))
        })?;

        debug!(file = %file_name, size = data.len(), "Stored photo");
        Ok(format!("{UPLOAD_DIR}/{file_name}"))
    }

    /// Read a stored photo by file name (the part after `uploads/`).
    pub async fn get_photo(&self, file_name: &str) -> Result<Vec<u8>, ServerError> {
        let path = ensure_within(&self.base_path, file_name)?;

        if !path.is_file() {
            return Err(ServerError::NotFound("Photo not found".to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            ServerError::BlobStorage(format!("Failed to read photo {}: {}", file_name, e))
        })?;

        debug!(file = %file_name, size = data.len(), "Retrieved photo");
        Ok(data)
    }
}
