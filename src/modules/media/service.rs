use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::constants::MEDIA_BUCKET_PREFIX;
use crate::modules::{
    media::{
        model::{UploadConfig, UploadResponse},
        storage::MediaStorage,
    },
    user::{repository::UserRepository, schema::MediaSlot},
};

#[derive(Clone)]
pub struct MediaService {
    users: Arc<dyn UserRepository + Send + Sync>,
    storage: Arc<dyn MediaStorage + Send + Sync>,
    config: UploadConfig,
}

impl MediaService {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        storage: Arc<dyn MediaStorage + Send + Sync>,
        config: UploadConfig,
    ) -> Self {
        Self { users, storage, config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    /// Validate file type and size
    fn validate_file(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError> {
        if file_size == 0 {
            return Err(error::SystemError::bad_request("Missing file"));
        }

        if file_size > self.config.max_file_size {
            return Err(error::SystemError::bad_request(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        if !self.config.allowed_mime_types.iter().any(|m| m == mime_type) {
            return Err(error::SystemError::bad_request(format!(
                "File type '{}' is not allowed",
                mime_type
            )));
        }

        Ok(())
    }

    /// `users/{id}/{slot}.{ext}`; one object per slot, re-uploads overwrite it.
    fn object_path(user_id: &Uuid, slot: MediaSlot, original_filename: &str) -> String {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "jpg".to_string());

        format!("{}/{}/{}.{}", MEDIA_BUCKET_PREFIX, user_id, slot.as_str(), extension)
    }

    pub async fn upload_user_media(
        &self,
        user_id: Uuid,
        slot: MediaSlot,
        original_filename: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<UploadResponse, error::SystemError> {
        self.validate_file(bytes.len(), mime_type)?;

        let path = Self::object_path(&user_id, slot, original_filename);
        self.storage.upload(&path, &bytes, mime_type).await?;
        self.users.set_media(&user_id, slot, &path).await?;

        log::info!("User {} uploaded a new {}", user_id, slot.as_str());

        let url = self.storage.signed_url(&path, self.config.signed_url_ttl)?;
        Ok(UploadResponse { ok: true, path, url })
    }

    /// Returns the object bytes and their content type when `token` signs `path`.
    pub async fn fetch(
        &self,
        path: &str,
        token: &str,
    ) -> Result<(Vec<u8>, String), error::SystemError> {
        self.storage.verify_signature(path, token)?;

        let bytes = self
            .storage
            .read(path)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Media not found"))?;

        let mime = mime_guess::from_path(path).first_or_octet_stream().to_string();
        Ok((bytes, mime))
    }
}
