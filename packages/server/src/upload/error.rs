use common::ValidationError;
use common::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Object storage error: {0}")]
    Gateway(#[from] StorageError),

    /// The object is missing or does not match what was declared.
    #[error("File has not been uploaded: {0}")]
    NotUploaded(String),
}
