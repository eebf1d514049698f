use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StorageError;
use crate::upload::CompletedPart;

/// Object key for a file's bytes.
pub fn object_key(file_uuid: &Uuid) -> String {
    format!("files/{file_uuid}")
}

/// Metadata returned by a HEAD request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
}

/// S3-compatible object storage, addressed by key.
///
/// Bytes never pass through the server: uploads and downloads happen against
/// presigned URLs handed to the client.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Presigned PUT for a whole object.
    async fn presign_put(
        &self,
        key: &str,
        mime_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Start a multipart upload and return its upload id.
    async fn create_multipart_upload(
        &self,
        key: &str,
        mime_type: &str,
    ) -> Result<String, StorageError>;

    /// Presigned PUT for one part of a multipart upload.
    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StorageError>;

    /// Presigned GET for downloading.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// `None` if the object does not exist.
    async fn head_object(&self, key: &str) -> Result<Option<ObjectHead>, StorageError>;

    /// Returns `true` if something was deleted, `false` if the key was absent.
    async fn delete_object(&self, key: &str) -> Result<bool, StorageError>;
}
