use chrono::{DateTime, Utc};
use common::{CompletedPart, Payload, Resource, ResourceType, UploadPlan};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub use super::shared::Pagination;
use super::shared::double_option;
use crate::error::AppError;
use crate::service::{EntryChanges, NewEntry, NewFile, UploadCompletion};

#[derive(Deserialize, ToSchema)]
pub struct CreateLinkRequest {
    /// Raw slug: letters, digits, `_` and `-`.
    #[schema(example = "docs")]
    pub slug: String,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[schema(example = "https://example.com/handbook")]
    pub target_url: String,
}

impl CreateLinkRequest {
    pub fn into_parts(self) -> (NewEntry, String) {
        (
            NewEntry {
                slug: self.slug,
                password: self.password,
                expires_at: self.expires_at,
            },
            self.target_url,
        )
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateFileRequest {
    #[schema(example = "slides")]
    pub slug: String,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[schema(example = "talk.pdf")]
    pub filename: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    /// Size in bytes, at most 10 GiB.
    #[schema(example = 1048576)]
    pub size: i64,
}

impl CreateFileRequest {
    pub fn into_parts(self) -> (NewEntry, NewFile) {
        (
            NewEntry {
                slug: self.slug,
                password: self.password,
                expires_at: self.expires_at,
            },
            NewFile {
                filename: self.filename,
                mime_type: self.mime_type,
                size: self.size,
            },
        )
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEntryRequest {
    /// New raw slug.
    pub slug: Option<String>,
    /// Only applied when `update_password` is true; omit or null to remove protection.
    pub password: Option<String>,
    /// Whether `password` should replace the stored one.
    pub update_password: bool,
    /// Absent keeps the current expiry, null removes it.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateEntryRequest> for EntryChanges {
    fn from(req: UpdateEntryRequest) -> Self {
        Self {
            slug: req.slug,
            password: req.password,
            update_password: req.update_password,
            expires_at: req.expires_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLinkRequest {
    pub target_url: String,
}

/// Body for finishing an upload. Single uploads send `{}`.
#[derive(Deserialize, ToSchema, Default)]
pub struct CompleteUploadRequest {
    pub upload_id: Option<String>,
    pub parts: Option<Vec<CompletedPart>>,
}

impl TryFrom<CompleteUploadRequest> for UploadCompletion {
    type Error = AppError;

    fn try_from(req: CompleteUploadRequest) -> Result<Self, Self::Error> {
        match (req.upload_id, req.parts) {
            (None, None) => Ok(UploadCompletion::Single),
            (Some(upload_id), Some(parts)) => Ok(UploadCompletion::Multipart { upload_id, parts }),
            _ => Err(AppError::Validation(
                "upload_id and parts must be given together".into(),
            )),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UnlockRequest {
    pub password: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResourceListQuery {
    /// 1-based page number. Default: 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Default: 20.
    pub limit: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LinkResponse {
    pub target_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct FileResponse {
    pub file_uuid: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub pending: bool,
}

/// A resource as shown to administrators. Password hashes are always redacted.
#[derive(Serialize, ToSchema)]
pub struct ResourceResponse {
    pub id: i64,
    /// Canonical (escaped) slug.
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    /// `"REDACTED"` when protected.
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileResponse>,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        let kind = resource.kind();
        let Resource { entry, payload } = resource.redacted();
        let (link, file) = match payload {
            Payload::Link(l) => (
                Some(LinkResponse {
                    target_url: l.target_url,
                }),
                None,
            ),
            Payload::File(f) => (
                None,
                Some(FileResponse {
                    file_uuid: f.file_uuid,
                    filename: f.filename,
                    mime_type: f.mime_type,
                    size: f.size,
                    pending: f.pending,
                }),
            ),
        };
        Self {
            id: entry.id,
            slug: entry.slug,
            kind,
            password_hash: entry.password_hash,
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            link,
            file,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreateFileResponse {
    pub resource: ResourceResponse,
    pub file_uuid: Uuid,
    pub upload: UploadPlan,
}

#[derive(Serialize, ToSchema)]
pub struct ResourceListResponse {
    pub data: Vec<ResourceResponse>,
    pub pagination: Pagination,
}
