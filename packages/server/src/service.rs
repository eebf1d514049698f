//! Resource flows that combine the store, the upload orchestrator and password checks.

use chrono::{DateTime, Utc};
use common::password::{hash_password, verify_password};
use common::upload::{is_multipart, part_count};
use common::validate::{
    canonical_slug, validate_expires_at, validate_raw_password, validate_raw_slug,
};
use common::{CompletedPart, Entry, Payload, Resource, UploadPlan};
use sea_orm::{ConnectionTrait, TransactionTrait};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::shared::page_offset;
use crate::store::{ResourceRef, ResourceStore};
use crate::upload::UploadOrchestrator;

/// Entry fields as submitted by an administrator.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Raw, unescaped slug.
    pub slug: String,
    pub password: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
}

/// Partial update of an entry. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct EntryChanges {
    pub slug: Option<String>,
    /// Only read when `update_password` is set; `None` then removes protection.
    pub password: Option<String>,
    pub update_password: bool,
    /// `Some(None)` clears the expiry.
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone)]
pub enum UploadCompletion {
    Single,
    Multipart {
        upload_id: String,
        parts: Vec<CompletedPart>,
    },
}

/// What a visitor gets for a slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResolvedResource {
    Link {
        target_url: String,
    },
    File {
        filename: String,
        mime_type: String,
        size: i64,
        /// Presigned GET, valid for `url_expires_in` seconds.
        download_url: String,
        url_expires_in: u64,
    },
}

pub struct ResourceService<'a, C: ConnectionTrait + TransactionTrait> {
    store: ResourceStore<'a, C>,
    uploads: &'a UploadOrchestrator,
}

impl<'a, C: ConnectionTrait + TransactionTrait> ResourceService<'a, C> {
    pub fn new(conn: &'a C, uploads: &'a UploadOrchestrator) -> Self {
        Self {
            store: ResourceStore::new(conn),
            uploads,
        }
    }

    #[instrument(skip(self, entry), fields(slug = %entry.slug))]
    pub async fn create_link(
        &self,
        entry: NewEntry,
        target_url: String,
    ) -> Result<Resource, AppError> {
        let mut resource = Resource::link(build_entry(entry, Utc::now())?, target_url);
        let id = self.store.insert_resource(&resource).await?;
        resource.assign_id(id);
        info!(entry_id = id, "Link created");
        Ok(resource)
    }

    /// Insert a pending file and plan its upload.
    ///
    /// If planning fails the new resource is deleted again; a failing cleanup
    /// is logged and the planning error is returned.
    #[instrument(skip(self, entry, file), fields(slug = %entry.slug, size = file.size))]
    pub async fn create_file(
        &self,
        entry: NewEntry,
        file: NewFile,
    ) -> Result<(Resource, UploadPlan), AppError> {
        let file_uuid = Uuid::new_v4();
        let mut resource = Resource::file(
            build_entry(entry, Utc::now())?,
            file_uuid,
            file.filename,
            file.mime_type.clone(),
            file.size,
        );
        let id = self.store.insert_resource(&resource).await?;
        resource.assign_id(id);

        match self
            .uploads
            .generate_upload_plan(file.size, &file.mime_type, &file_uuid)
            .await
        {
            Ok(plan) => {
                info!(entry_id = id, %file_uuid, "File created, awaiting upload");
                Ok((resource, plan))
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete_resource(ResourceRef::Id(id)).await {
                    error!(
                        entry_id = id,
                        error = %cleanup,
                        "Failed to remove file resource after upload planning failed"
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Confirm the upload of a pending file and clear its pending flag.
    #[instrument(skip(self, completion))]
    pub async fn finish_file_upload(
        &self,
        slug: &str,
        completion: UploadCompletion,
    ) -> Result<Resource, AppError> {
        let mut resource = self.store.get_resource(&canonical_slug(slug)).await?;
        let Payload::File(file) = &mut resource.payload else {
            return Err(AppError::Validation(format!("Resource '{slug}' is not a file")));
        };
        if !file.pending {
            return Err(AppError::Conflict("File has already been uploaded".into()));
        }

        let multipart = is_multipart(file.size as u64);
        match completion {
            UploadCompletion::Multipart { upload_id, parts } if multipart => {
                let expected = part_count(file.size as u64) as usize;
                if parts.len() != expected {
                    return Err(AppError::Validation(format!(
                        "Upload has {expected} parts, {} were completed",
                        parts.len()
                    )));
                }
                self.uploads
                    .complete_multipart_upload(&file.file_uuid, &upload_id, &parts)
                    .await?;
            }
            UploadCompletion::Single if !multipart => {
                self.uploads
                    .confirm_single_upload(&file.file_uuid, file.size)
                    .await?;
            }
            UploadCompletion::Single => {
                return Err(AppError::Validation(
                    "Multipart upload requires upload_id and parts".into(),
                ));
            }
            UploadCompletion::Multipart { .. } => {
                return Err(AppError::Validation(
                    "File was planned as a single upload".into(),
                ));
            }
        }

        self.store.mark_file_uploaded(file.entry_id).await?;
        file.pending = false;
        info!(entry_id = file.entry_id, "File upload finished");
        Ok(resource)
    }

    /// Delete a resource and, for files, its object.
    #[instrument(skip(self))]
    pub async fn delete_resource(&self, slug: &str) -> Result<(), AppError> {
        let resource = self.store.get_resource(&canonical_slug(slug)).await?;
        self.store
            .delete_resource(ResourceRef::Id(resource.id()))
            .await?;

        if let Some(file) = resource.as_file()
            && let Err(e) = self.uploads.delete_object(&file.file_uuid).await
        {
            warn!(
                entry_id = resource.id(),
                file_uuid = %file.file_uuid,
                error = %e,
                "Failed to delete stored object"
            );
        }
        Ok(())
    }

    #[instrument(skip(self, changes), fields(update_password = changes.update_password))]
    pub async fn update_entry(
        &self,
        slug: &str,
        changes: EntryChanges,
    ) -> Result<Resource, AppError> {
        let mut resource = self.store.get_resource(&canonical_slug(slug)).await?;

        if let Some(raw) = changes.slug {
            validate_raw_slug(&raw)?;
            resource.entry.slug = canonical_slug(&raw);
        }
        if changes.update_password {
            resource.entry.password_hash = match changes.password {
                Some(password) => Some(hash_new_password(&password)?),
                None => None,
            };
        }
        match changes.expires_at {
            Some(Some(expires_at)) => {
                validate_expires_at(expires_at, Utc::now())?;
                resource.entry.expires_at = Some(expires_at);
            }
            Some(None) => resource.entry.expires_at = None,
            None => {}
        }

        self.store
            .update_resource(&resource, changes.update_password)
            .await?;
        Ok(resource)
    }

    #[instrument(skip(self, target_url))]
    pub async fn update_link(&self, slug: &str, target_url: String) -> Result<Resource, AppError> {
        let mut resource = self.store.get_resource(&canonical_slug(slug)).await?;
        let Payload::Link(link) = &mut resource.payload else {
            return Err(AppError::Validation(format!("Resource '{slug}' is not a link")));
        };
        link.target_url = target_url;

        self.store.update_resource(&resource, false).await?;
        Ok(resource)
    }

    /// Public lookup. Expired resources do not exist; protected ones need the password.
    #[instrument(skip(self, password))]
    pub async fn resolve(
        &self,
        slug: &str,
        password: Option<&str>,
    ) -> Result<ResolvedResource, AppError> {
        let resource = self.store.get_resource(&canonical_slug(slug)).await?;
        if resource.entry.is_expired(Utc::now()) {
            return Err(AppError::NotFound(format!("Resource not found: slug '{slug}'")));
        }

        if let Some(hash) = &resource.entry.password_hash {
            let password = password.ok_or(AppError::PasswordRequired)?;
            if !verify_password(password, hash)? {
                return Err(AppError::InvalidPassword);
            }
        }

        match resource.payload {
            Payload::Link(link) => Ok(ResolvedResource::Link {
                target_url: link.target_url,
            }),
            Payload::File(file) => {
                if file.pending {
                    return Err(AppError::Conflict("File has not been uploaded yet".into()));
                }
                let download_url = self.uploads.download_url(&file.file_uuid).await?;
                Ok(ResolvedResource::File {
                    filename: file.filename,
                    mime_type: file.mime_type,
                    size: file.size,
                    download_url,
                    url_expires_in: self.uploads.url_ttl().as_secs(),
                })
            }
        }
    }

    /// One page of resources with password hashes redacted, plus the total count.
    pub async fn list(&self, page: u64, limit: u64) -> Result<(Vec<Resource>, u64), AppError> {
        let offset = page_offset(page, limit)
            .ok_or_else(|| AppError::Validation("page is out of range".into()))?;
        let total = self.store.count_resources().await?;
        let resources = self
            .store
            .list_resources(offset, limit)
            .await?
            .into_iter()
            .map(Resource::redacted)
            .collect();
        Ok((resources, total))
    }
}

fn hash_new_password(password: &str) -> Result<String, AppError> {
    validate_raw_password(password)?;
    Ok(hash_password(password)?)
}

fn build_entry(entry: NewEntry, now: DateTime<Utc>) -> Result<Entry, AppError> {
    validate_raw_slug(&entry.slug)?;
    if let Some(expires_at) = entry.expires_at {
        validate_expires_at(expires_at, now)?;
    }
    let password_hash = entry
        .password
        .as_deref()
        .map(hash_new_password)
        .transpose()?;

    Ok(Entry {
        id: 0,
        slug: canonical_slug(&entry.slug),
        password_hash,
        created_at: now,
        expires_at: entry.expires_at,
    })
}
