//! Image upload validation and storage.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::image::{image_extension, ImageUploaded};
use crate::repositories::ImageStore;

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn ImageStore>,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(store: Arc<dyn ImageStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Object key for an accepted upload, or 400 for anything else.
    pub fn object_key(&self, content_type: Option<&str>, len: usize) -> AppResult<String> {
        let content_type =
            content_type.ok_or_else(|| AppError::BadRequest("Missing content type".to_string()))?;
        let ext = image_extension(content_type).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported image type: {}", content_type))
        })?;
        if len == 0 {
            return Err(AppError::BadRequest("Empty file".to_string()));
        }
        if len > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "File exceeds {} bytes",
                self.max_bytes
            )));
        }
        Ok(format!("images/{}.{}", Uuid::new_v4(), ext))
    }

    pub async fn upload(&self, content_type: Option<&str>, bytes: Vec<u8>) -> AppResult<ImageUploaded> {
        let key = self.object_key(content_type, bytes.len())?;
        let size = bytes.len();
        let image_url = self
            .store
            .put(&key, content_type.unwrap_or_default(), bytes)
            .await?;
        info!(key = %key, size, "image uploaded");
        Ok(ImageUploaded { image_url })
    }
}
