use std::fmt;

use common::ValidationError;
use sea_orm::DbErr;
use thiserror::Error;

/// Fields that are fixed once a resource exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmutableField {
    Type,
    CreatedAt,
    /// uuid, filename, MIME type and size of a file.
    FileContent,
}

impl fmt::Display for ImmutableField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => f.write_str("type is immutable"),
            Self::CreatedAt => f.write_str("created_at is immutable"),
            Self::FileContent => {
                f.write_str("file content is immutable, delete and recreate instead")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Slug '{0}' is already taken")]
    DuplicateSlug(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Update rejected: {0}")]
    Immutable(ImmutableField),

    /// Unexpected row count or a missing sub-row. Always a defect.
    #[error("Consistency violation: {0}")]
    Consistency(String),

    #[error("Database error: {0}")]
    Transaction(#[from] DbErr),
}
