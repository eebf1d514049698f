use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::resource::{
    CompleteUploadRequest, CreateFileRequest, CreateFileResponse, ResourceResponse,
};
use crate::service::{ResourceService, UploadCompletion};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/files",
    tag = "Files",
    operation_id = "createFile",
    summary = "Create a file resource and plan its upload",
    description = "Creates a pending file and returns presigned upload URLs. Files up to 50 MiB get a single PUT URL, larger ones a multipart upload with one URL per 50 MiB part. URLs are valid for 30 minutes by default.",
    request_body = CreateFileRequest,
    responses(
        (status = 201, description = "File created, upload plan returned", body = CreateFileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already taken (SLUG_TAKEN)", body = ErrorBody),
        (status = 500, description = "Object storage unavailable (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(slug = %payload.slug, size = payload.size))]
pub async fn create_file(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (entry, file) = payload.into_parts();
    let (resource, upload) = ResourceService::new(&state.db, &state.uploads)
        .create_file(entry, file)
        .await?;

    let file_uuid = resource
        .as_file()
        .map(|f| f.file_uuid)
        .ok_or_else(|| AppError::Internal("created file resource has no file row".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateFileResponse {
            resource: resource.into(),
            file_uuid,
            upload,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/files/{slug}/complete",
    tag = "Files",
    operation_id = "completeFileUpload",
    summary = "Finish a file upload",
    description = "For multipart uploads send `upload_id` and the ETag of every part in order. For single uploads send `{}`; the object's size is checked against the declared size.",
    params(("slug" = String, Path, description = "File slug")),
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Upload finished", body = ResourceResponse),
        (status = 400, description = "Not a file or bad part list (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already uploaded or object missing (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn complete_upload(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<CompleteUploadRequest>,
) -> Result<Json<ResourceResponse>, AppError> {
    let completion = UploadCompletion::try_from(payload)?;
    let resource = ResourceService::new(&state.db, &state.uploads)
        .finish_file_upload(&slug, completion)
        .await?;
    Ok(Json(resource.into()))
}
