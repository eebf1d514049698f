use std::fmt;

use thiserror::Error;

/// Errors returned by an object storage gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The request could not be signed, sent or decoded.
    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("{operation} returned HTTP status {status}")]
    Status { operation: &'static str, status: u16 },

    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn request(operation: &'static str, err: impl fmt::Display) -> Self {
        Self::Request {
            operation,
            message: err.to_string(),
        }
    }
}
