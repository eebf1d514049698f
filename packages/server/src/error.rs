use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::ValidationError;
use common::password::PasswordError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::store::StoreError;
use crate::upload::UploadError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `NOT_FOUND`,
    /// `CONFLICT`, `SLUG_TAKEN`, `PASSWORD_REQUIRED`, `INVALID_PASSWORD`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid slug: slug cannot be empty")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    SlugTaken(String),
    /// The resource is protected and no password was supplied.
    PasswordRequired,
    InvalidPassword,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::SlugTaken(slug) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "SLUG_TAKEN",
                    message: format!("Slug '{slug}' is already taken"),
                },
            ),
            AppError::PasswordRequired => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PASSWORD_REQUIRED",
                    message: "This resource is password protected".into(),
                },
            ),
            AppError::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_PASSWORD",
                    message: "Incorrect password".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => e.into(),
            StoreError::DuplicateSlug(slug) => AppError::SlugTaken(slug),
            StoreError::NotFound(what) => AppError::NotFound(format!("Resource not found: {what}")),
            StoreError::Immutable(field) => AppError::Conflict(field.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Validation(e) => e.into(),
            UploadError::NotUploaded(reason) => {
                AppError::Conflict(format!("File has not been uploaded: {reason}"))
            }
            UploadError::Gateway(e) => AppError::Internal(e.to_string()),
        }
    }
}
