use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue, header::CONTENT_TYPE};
use s3::error::S3Error;
use s3::serde_types::Part;
use s3::{Bucket, Region, creds::Credentials};
use tracing::debug;

use super::error::StorageError;
use super::traits::{ObjectHead, ObjectStorage};
use crate::config::StorageConfig;
use crate::upload::CompletedPart;

/// Presigned URLs are capped at seven days by S3.
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

/// [`ObjectStorage`] backed by an S3-compatible bucket.
pub struct S3ObjectStorage {
    bucket: Box<Bucket>,
}

impl S3ObjectStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(e.to_string()))?;
        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }
        Ok(Self { bucket })
    }
}

fn expiry_secs(ttl: Duration) -> u32 {
    ttl.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32
}

fn check_status(operation: &'static str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Status { operation, status })
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn presign_put(
        &self,
        key: &str,
        mime_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(mime_type)
            .map_err(|e| StorageError::request("presign put", e))?;
        headers.insert(CONTENT_TYPE, value);
        self.bucket
            .presign_put(key, expiry_secs(ttl), Some(headers), None)
            .await
            .map_err(|e| StorageError::request("presign put", e))
    }

    async fn create_multipart_upload(
        &self,
        key: &str,
        mime_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .bucket
            .initiate_multipart_upload(key, mime_type)
            .await
            .map_err(|e| StorageError::request("create multipart upload", e))?;
        debug!(key, upload_id = %response.upload_id, "Multipart upload created");
        Ok(response.upload_id)
    }

    async fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let queries = HashMap::from([
            ("partNumber".to_string(), part_number.to_string()),
            ("uploadId".to_string(), upload_id.to_string()),
        ]);
        self.bucket
            .presign_put(key, expiry_secs(ttl), None, Some(queries))
            .await
            .map_err(|e| StorageError::request("presign upload part", e))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StorageError> {
        let parts = parts
            .iter()
            .map(|p| Part {
                part_number: p.part_number,
                etag: p.etag.clone(),
            })
            .collect();
        let response = self
            .bucket
            .complete_multipart_upload(key, upload_id, parts)
            .await
            .map_err(|e| StorageError::request("complete multipart upload", e))?;
        check_status("complete multipart upload", response.status_code())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.bucket
            .presign_get(key, expiry_secs(ttl), None)
            .await
            .map_err(|e| StorageError::request("presign get", e))
    }

    async fn head_object(&self, key: &str) -> Result<Option<ObjectHead>, StorageError> {
        match self.bucket.head_object(key).await {
            Ok((_, 404)) | Err(S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Ok((head, status)) => {
                check_status("head object", status)?;
                Ok(Some(ObjectHead {
                    size: head.content_length.and_then(|len| u64::try_from(len).ok()),
                    content_type: head.content_type,
                    etag: head.e_tag,
                }))
            }
            Err(e) => Err(StorageError::request("head object", e)),
        }
    }

    async fn delete_object(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.delete_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(false),
            Ok(response) => {
                check_status("delete object", response.status_code())?;
                Ok(true)
            }
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(StorageError::request("delete object", e)),
        }
    }
}
