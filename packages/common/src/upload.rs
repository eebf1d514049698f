//! Upload planning constants and the shapes handed to clients.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::validate::ValidationError;

/// Size of every multipart part but the last.
pub const PART_SIZE: u64 = 50 * 1024 * 1024;
pub const MAX_FILE_SIZE: i64 = 10 * 1024 * 1024 * 1024;
/// Validity of presigned upload and download URLs.
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(30 * 60);

/// How the client should push the file's bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UploadPlan {
    /// One presigned PUT for the whole object.
    Single { upload_url: String },
    /// One presigned PUT per part, then a completion call.
    Multipart {
        upload_id: String,
        parts: Vec<PartUpload>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PartUpload {
    /// 1-based.
    pub part_number: u32,
    pub upload_url: String,
}

/// A part the client finished uploading, echoed back on completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// Files at or below one part size go up in a single request.
pub fn is_multipart(size: u64) -> bool {
    size > PART_SIZE
}

pub fn part_count(size: u64) -> u32 {
    size.div_ceil(PART_SIZE) as u32
}

/// Parts must be numbered 1..=n in order with non-empty ETags.
pub fn validate_completed_parts(parts: &[CompletedPart]) -> Result<(), ValidationError> {
    if parts.is_empty() {
        return Err(ValidationError::Parts("at least one part is required".into()));
    }
    for (index, part) in parts.iter().enumerate() {
        let expected = index as u32 + 1;
        if part.part_number != expected {
            return Err(ValidationError::Parts(format!(
                "expected part {expected}, got {}",
                part.part_number
            )));
        }
        if part.etag.trim().is_empty() {
            return Err(ValidationError::Parts(format!(
                "part {expected} has an empty ETag"
            )));
        }
    }
    Ok(())
}
