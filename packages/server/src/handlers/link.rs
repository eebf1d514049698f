use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::resource::{CreateLinkRequest, ResourceResponse, UpdateLinkRequest};
use crate::service::ResourceService;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/links",
    tag = "Links",
    operation_id = "createLink",
    summary = "Create a short link",
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Link created", body = ResourceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Slug already taken (SLUG_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(slug = %payload.slug))]
pub async fn create_link(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (entry, target_url) = payload.into_parts();
    let resource = ResourceService::new(&state.db, &state.uploads)
        .create_link(entry, target_url)
        .await?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

#[utoipa::path(
    patch,
    path = "/links/{slug}",
    tag = "Links",
    operation_id = "updateLink",
    summary = "Change a link's target URL",
    params(("slug" = String, Path, description = "Link slug")),
    request_body = UpdateLinkRequest,
    responses(
        (status = 200, description = "Link updated", body = ResourceResponse),
        (status = 400, description = "Invalid URL or not a link (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_link(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateLinkRequest>,
) -> Result<Json<ResourceResponse>, AppError> {
    let resource = ResourceService::new(&state.db, &state.uploads)
        .update_link(&slug, payload.target_url)
        .await?;
    Ok(Json(resource.into()))
}
