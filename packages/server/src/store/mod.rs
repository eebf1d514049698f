//! Transactional persistence of entries and their link or file rows.

mod error;

pub use error::{ImmutableField, StoreError};

use std::collections::HashMap;

use common::validate::validate_resource;
use common::{Entry, File, Link, Payload, Resource, ResourceType, ValidationError};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionSession, TransactionTrait,
};
use tracing::{debug, instrument};

use crate::entity::{entry, file, link};

/// How a caller addresses a resource to delete.
#[derive(Debug, Clone, Copy)]
pub enum ResourceRef<'s> {
    Id(i64),
    Slug(&'s str),
}

impl std::fmt::Display for ResourceRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "entry {id}"),
            Self::Slug(slug) => write!(f, "slug '{slug}'"),
        }
    }
}

pub struct ResourceStore<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> ResourceStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Fetch an entry by canonical slug together with its sub-row.
    #[instrument(skip(self))]
    pub async fn get_resource(&self, slug: &str) -> Result<Resource, StoreError> {
        let model = entry::Entity::find()
            .filter(entry::Column::Slug.eq(slug))
            .one(self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("slug '{slug}'")))?;

        let payload = match model.kind {
            ResourceType::Link => link::Entity::find_by_id(model.id)
                .one(self.conn)
                .await?
                .map(|l| Payload::Link(link_from_model(l))),
            ResourceType::File => file::Entity::find_by_id(model.id)
                .one(self.conn)
                .await?
                .map(|f| Payload::File(file_from_model(f))),
        };
        let payload = payload.ok_or_else(|| missing_sub_row(&model))?;

        Ok(Resource {
            entry: entry_from_model(model),
            payload,
        })
    }

    /// Page through all resources in insertion order.
    ///
    /// Password hashes are returned as stored; redact before exposing.
    #[instrument(skip(self))]
    pub async fn list_resources(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Resource>, StoreError> {
        let entries = entry::Entity::find()
            .order_by_asc(entry::Column::Id)
            .offset(Some(offset))
            .limit(Some(limit))
            .all(self.conn)
            .await?;
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();
        let mut links: HashMap<i64, link::Model> = link::Entity::find()
            .filter(link::Column::EntryId.is_in(ids.clone()))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|l| (l.entry_id, l))
            .collect();
        let mut files: HashMap<i64, file::Model> = file::Entity::find()
            .filter(file::Column::EntryId.is_in(ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|f| (f.entry_id, f))
            .collect();

        entries
            .into_iter()
            .map(|model| {
                let payload = match model.kind {
                    ResourceType::Link => links
                        .remove(&model.id)
                        .map(|l| Payload::Link(link_from_model(l))),
                    ResourceType::File => files
                        .remove(&model.id)
                        .map(|f| Payload::File(file_from_model(f))),
                };
                let payload = payload.ok_or_else(|| missing_sub_row(&model))?;
                Ok(Resource {
                    entry: entry_from_model(model),
                    payload,
                })
            })
            .collect()
    }

    pub async fn count_resources(&self) -> Result<u64, StoreError> {
        Ok(entry::Entity::find().count(self.conn).await?)
    }

    /// Insert an entry and its sub-row atomically, returning the new entry id.
    ///
    /// The ids inside `resource` are ignored and may be zero.
    #[instrument(skip(self, resource), fields(slug = %resource.entry.slug, kind = %resource.kind()))]
    pub async fn insert_resource(&self, resource: &Resource) -> Result<i64, StoreError> {
        validate_resource(resource)?;
        // Only mark_file_uploaded may clear the flag.
        if resource.as_file().is_some_and(|f| !f.pending) {
            return Err(ValidationError::Resource(
                "a new file must start out pending".into(),
            )
            .into());
        }

        let txn = self.conn.begin().await?;

        let new_entry = entry::ActiveModel {
            slug: Set(resource.entry.slug.clone()),
            kind: Set(resource.kind()),
            password_hash: Set(resource.entry.password_hash.clone()),
            created_at: Set(resource.entry.created_at),
            expires_at: Set(resource.entry.expires_at),
            ..Default::default()
        };
        let inserted = new_entry
            .insert(&txn)
            .await
            .map_err(|e| slug_conflict(e, &resource.entry.slug))?;
        let id = inserted.id;

        match &resource.payload {
            Payload::Link(l) => {
                link::ActiveModel {
                    entry_id: Set(id),
                    target_url: Set(l.target_url.clone()),
                }
                .insert(&txn)
                .await?;
            }
            Payload::File(f) => {
                file::ActiveModel {
                    entry_id: Set(id),
                    file_uuid: Set(f.file_uuid),
                    filename: Set(f.filename.clone()),
                    mime_type: Set(f.mime_type.clone()),
                    size: Set(f.size),
                    pending: Set(true),
                }
                .insert(&txn)
                .await
                .map_err(|e| match e.sql_err() {
                    Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Consistency(
                        format!("file UUID {} is already in use", f.file_uuid),
                    ),
                    _ => StoreError::Transaction(e),
                })?;
            }
        }

        txn.commit().await?;
        debug!(entry_id = id, "Resource inserted");
        Ok(id)
    }

    /// Update slug, password and expiry, plus the target URL of a link.
    ///
    /// Type, creation time and file content must match what is stored. With
    /// `update_password == false` the stored hash is kept whatever `resource`
    /// carries.
    #[instrument(skip(self, resource), fields(entry_id = resource.entry.id))]
    pub async fn update_resource(
        &self,
        resource: &Resource,
        update_password: bool,
    ) -> Result<(), StoreError> {
        let id = resource.entry.id;
        let txn = self.conn.begin().await?;

        let stored = entry::Entity::find_by_id(id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("entry {id}")))?;

        if stored.kind != resource.kind() {
            return Err(StoreError::Immutable(ImmutableField::Type));
        }
        if stored.created_at.timestamp() != resource.entry.created_at.timestamp() {
            return Err(StoreError::Immutable(ImmutableField::CreatedAt));
        }

        let mut candidate = resource.clone();
        if !update_password {
            candidate.entry.password_hash = stored.password_hash.clone();
        }
        validate_resource(&candidate)?;

        let result = entry::Entity::update_many()
            .col_expr(entry::Column::Slug, Expr::value(candidate.entry.slug.clone()))
            .col_expr(
                entry::Column::PasswordHash,
                Expr::value(candidate.entry.password_hash.clone()),
            )
            .col_expr(entry::Column::ExpiresAt, Expr::value(candidate.entry.expires_at))
            .filter(entry::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| slug_conflict(e, &candidate.entry.slug))?;
        expect_one_row("entries", result.rows_affected)?;

        match &candidate.payload {
            Payload::Link(l) => {
                let result = link::Entity::update_many()
                    .col_expr(link::Column::TargetUrl, Expr::value(l.target_url.clone()))
                    .filter(link::Column::EntryId.eq(id))
                    .exec(&txn)
                    .await?;
                expect_one_row("links", result.rows_affected)?;
            }
            Payload::File(f) => {
                let current = file::Entity::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| StoreError::Consistency(format!("entry {id} has no file row")))?;
                if !file_from_model(current).same_content(f) {
                    return Err(StoreError::Immutable(ImmutableField::FileContent));
                }
            }
        }

        txn.commit().await?;
        debug!(entry_id = id, "Resource updated");
        Ok(())
    }

    /// Clear the pending flag of a file. There is no way back.
    #[instrument(skip(self))]
    pub async fn mark_file_uploaded(&self, entry_id: i64) -> Result<(), StoreError> {
        let result = file::Entity::update_many()
            .col_expr(file::Column::Pending, Expr::value(false))
            .filter(file::Column::EntryId.eq(entry_id))
            .exec(self.conn)
            .await?;
        match result.rows_affected {
            0 => Err(StoreError::NotFound(format!("file for entry {entry_id}"))),
            1 => Ok(()),
            n => Err(StoreError::Consistency(format!(
                "marking entry {entry_id} uploaded touched {n} rows"
            ))),
        }
    }

    /// Delete an entry; its sub-row goes with it through the cascade.
    #[instrument(skip(self))]
    pub async fn delete_resource(&self, target: ResourceRef<'_>) -> Result<(), StoreError> {
        let delete = entry::Entity::delete_many();
        let delete = match target {
            ResourceRef::Id(id) => delete.filter(entry::Column::Id.eq(id)),
            ResourceRef::Slug(slug) => delete.filter(entry::Column::Slug.eq(slug)),
        };
        let result = delete.exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(target.to_string()));
        }
        debug!(%target, "Resource deleted");
        Ok(())
    }
}

fn slug_conflict(err: DbErr, slug: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::DuplicateSlug(slug.to_string()),
        _ => StoreError::Transaction(err),
    }
}

fn expect_one_row(table: &str, rows: u64) -> Result<(), StoreError> {
    if rows == 1 {
        Ok(())
    } else {
        Err(StoreError::Consistency(format!(
            "expected 1 row in {table} to change, got {rows}"
        )))
    }
}

fn missing_sub_row(model: &entry::Model) -> StoreError {
    StoreError::Consistency(format!("entry {} has no {} row", model.id, model.kind))
}

pub(crate) fn entry_from_model(model: entry::Model) -> Entry {
    Entry {
        id: model.id,
        slug: model.slug,
        password_hash: model.password_hash,
        created_at: model.created_at,
        expires_at: model.expires_at,
    }
}

fn link_from_model(model: link::Model) -> Link {
    Link {
        entry_id: model.entry_id,
        target_url: model.target_url,
    }
}

pub(crate) fn file_from_model(model: file::Model) -> File {
    File {
        entry_id: model.entry_id,
        file_uuid: model.file_uuid,
        filename: model.filename,
        mime_type: model.mime_type,
        size: model.size,
        pending: model.pending,
    }
}
