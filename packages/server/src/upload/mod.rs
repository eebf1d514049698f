//! Getting file bytes into object storage through presigned URLs.

mod error;

pub use error::UploadError;

use std::sync::Arc;
use std::time::Duration;

use common::storage::{ObjectStorage, object_key};
use common::upload::{is_multipart, part_count, validate_completed_parts};
use common::validate::{validate_file_uuid, validate_mime_type, validate_size};
use common::{CompletedPart, PartUpload, UploadPlan};
use tracing::{debug, instrument};
use uuid::Uuid;

pub struct UploadOrchestrator {
    storage: Arc<dyn ObjectStorage>,
    url_ttl: Duration,
}

impl UploadOrchestrator {
    pub fn new(storage: Arc<dyn ObjectStorage>, url_ttl: Duration) -> Self {
        Self { storage, url_ttl }
    }

    pub fn url_ttl(&self) -> Duration {
        self.url_ttl
    }

    /// Decide between a single PUT and a multipart upload and presign the URLs.
    ///
    /// Any gateway failure aborts the whole plan. A multipart session opened
    /// before the failure is left to expire on the storage side.
    #[instrument(skip(self), fields(file_uuid = %file_uuid))]
    pub async fn generate_upload_plan(
        &self,
        size: i64,
        mime_type: &str,
        file_uuid: &Uuid,
    ) -> Result<UploadPlan, UploadError> {
        validate_size(size)?;
        validate_mime_type(mime_type)?;
        validate_file_uuid(file_uuid)?;

        let key = object_key(file_uuid);
        let size = size as u64;

        if !is_multipart(size) {
            let upload_url = self
                .storage
                .presign_put(&key, mime_type, self.url_ttl)
                .await?;
            return Ok(UploadPlan::Single { upload_url });
        }

        let upload_id = self.storage.create_multipart_upload(&key, mime_type).await?;
        let count = part_count(size);
        let mut parts = Vec::with_capacity(count as usize);
        for part_number in 1..=count {
            let upload_url = self
                .storage
                .presign_upload_part(&key, &upload_id, part_number, self.url_ttl)
                .await?;
            parts.push(PartUpload {
                part_number,
                upload_url,
            });
        }
        debug!(parts = count, "Multipart upload planned");

        Ok(UploadPlan::Multipart { upload_id, parts })
    }

    /// Finalize a multipart upload. On failure the session stays open.
    #[instrument(skip(self, parts), fields(file_uuid = %file_uuid, parts = parts.len()))]
    pub async fn complete_multipart_upload(
        &self,
        file_uuid: &Uuid,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), UploadError> {
        validate_file_uuid(file_uuid)?;
        if upload_id.trim().is_empty() {
            return Err(common::ValidationError::Parts("upload id is required".into()).into());
        }
        validate_completed_parts(parts)?;

        self.storage
            .complete_multipart_upload(&object_key(file_uuid), upload_id, parts)
            .await?;
        Ok(())
    }

    /// Check that a single-PUT upload landed with the declared size.
    #[instrument(skip(self), fields(file_uuid = %file_uuid))]
    pub async fn confirm_single_upload(
        &self,
        file_uuid: &Uuid,
        expected_size: i64,
    ) -> Result<(), UploadError> {
        let head = self
            .storage
            .head_object(&object_key(file_uuid))
            .await?
            .ok_or_else(|| UploadError::NotUploaded("object does not exist".into()))?;

        match head.size {
            Some(size) if size as i64 == expected_size => Ok(()),
            Some(size) => Err(UploadError::NotUploaded(format!(
                "object is {size} bytes, expected {expected_size}"
            ))),
            None => Err(UploadError::NotUploaded("object size is unknown".into())),
        }
    }

    /// Presigned GET for a stored file.
    pub async fn download_url(&self, file_uuid: &Uuid) -> Result<String, UploadError> {
        Ok(self
            .storage
            .presign_get(&object_key(file_uuid), self.url_ttl)
            .await?)
    }

    pub async fn delete_object(&self, file_uuid: &Uuid) -> Result<bool, UploadError> {
        Ok(self.storage.delete_object(&object_key(file_uuid)).await?)
    }
}
