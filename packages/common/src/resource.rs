#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::storage::object_key;

/// Kind of payload an entry resolves to.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Redirects to a target URL.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "link"))]
    Link,
    /// Serves an uploaded object.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "file"))]
    File,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link" => Ok(Self::Link),
            "file" => Ok(Self::File),
            other => Err(format!("unknown resource type: {other}")),
        }
    }
}

/// Identity and metadata shared by every addressable resource.
///
/// The entry's type is not stored here: it is derived from the [`Payload`] the
/// entry is paired with inside a [`Resource`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Assigned by the store; `0` before insertion.
    pub id: i64,
    /// Canonical (path-escaped) slug.
    pub slug: String,
    /// PHC-formatted password hash, if the resource is protected.
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// A not-yet-persisted entry.
    pub fn new(
        slug: impl Into<String>,
        password_hash: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: 0,
            slug: slug.into(),
            password_hash,
            created_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// An entry expiring exactly at `now` is already expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub entry_id: i64,
    /// Absolute URL with scheme and host.
    pub target_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub entry_id: i64,
    /// Version 4 UUID, also the object key suffix.
    pub file_uuid: Uuid,
    pub filename: String,
    pub mime_type: String,
    /// Declared size in bytes.
    pub size: i64,
    /// `true` until the upload has been confirmed.
    pub pending: bool,
}

impl File {
    /// Object storage key holding this file's bytes.
    pub fn object_key(&self) -> String {
        object_key(&self.file_uuid)
    }

    /// Whether the immutable content fields match.
    pub fn same_content(&self, other: &File) -> bool {
        self.file_uuid == other.file_uuid
            && self.filename == other.filename
            && self.mime_type == other.mime_type
            && self.size == other.size
    }
}

/// Type-specific half of a [`Resource`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Link(Link),
    File(File),
}

impl Payload {
    pub fn kind(&self) -> ResourceType {
        match self {
            Self::Link(_) => ResourceType::Link,
            Self::File(_) => ResourceType::File,
        }
    }

    pub fn entry_id(&self) -> i64 {
        match self {
            Self::Link(link) => link.entry_id,
            Self::File(file) => file.entry_id,
        }
    }
}

/// An entry together with exactly one payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub entry: Entry,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Resource {
    pub fn link(entry: Entry, target_url: impl Into<String>) -> Self {
        let entry_id = entry.id;
        Self {
            entry,
            payload: Payload::Link(Link {
                entry_id,
                target_url: target_url.into(),
            }),
        }
    }

    /// A new file resource; it starts out pending.
    pub fn file(
        entry: Entry,
        file_uuid: Uuid,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        size: i64,
    ) -> Self {
        let entry_id = entry.id;
        Self {
            entry,
            payload: Payload::File(File {
                entry_id,
                file_uuid,
                filename: filename.into(),
                mime_type: mime_type.into(),
                size,
                pending: true,
            }),
        }
    }

    pub fn kind(&self) -> ResourceType {
        self.payload.kind()
    }

    pub fn id(&self) -> i64 {
        self.entry.id
    }

    pub fn as_link(&self) -> Option<&Link> {
        match &self.payload {
            Payload::Link(link) => Some(link),
            Payload::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match &self.payload {
            Payload::File(file) => Some(file),
            Payload::Link(_) => None,
        }
    }

    /// Set the entry id on both halves of the aggregate.
    pub fn assign_id(&mut self, id: i64) {
        self.entry.id = id;
        match &mut self.payload {
            Payload::Link(link) => link.entry_id = id,
            Payload::File(file) => file.entry_id = id,
        }
    }

    /// Copy with the password hash masked, for listings.
    pub fn redacted(mut self) -> Self {
        if self.entry.password_hash.is_some() {
            self.entry.password_hash = Some("REDACTED".to_string());
        }
        self
    }
}
