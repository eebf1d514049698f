use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::resource::UnlockRequest;
use crate::service::{ResolvedResource, ResourceService};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = "Public",
    operation_id = "getResource",
    summary = "Resolve a slug",
    description = "Returns the target URL of a link or a presigned download URL of a file. Expired resources are reported as not found.",
    params(("slug" = String, Path, description = "Resource slug")),
    responses(
        (status = 200, description = "Resolved resource", body = ResolvedResource),
        (status = 403, description = "Password required (PASSWORD_REQUIRED)", body = ErrorBody),
        (status = 404, description = "Not found or expired (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "File not uploaded yet (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_resource(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ResolvedResource>, AppError> {
    let resolved = ResourceService::new(&state.db, &state.uploads)
        .resolve(&slug, None)
        .await?;
    Ok(Json(resolved))
}

#[utoipa::path(
    post,
    path = "/{slug}/unlock",
    tag = "Public",
    operation_id = "unlockResource",
    summary = "Resolve a password-protected slug",
    params(("slug" = String, Path, description = "Resource slug")),
    request_body = UnlockRequest,
    responses(
        (status = 200, description = "Resolved resource", body = ResolvedResource),
        (status = 401, description = "Wrong password (INVALID_PASSWORD)", body = ErrorBody),
        (status = 404, description = "Not found or expired (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "File not uploaded yet (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn unlock_resource(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UnlockRequest>,
) -> Result<Json<ResolvedResource>, AppError> {
    let resolved = ResourceService::new(&state.db, &state.uploads)
        .resolve(&slug, Some(&payload.password))
        .await?;
    Ok(Json(resolved))
}
