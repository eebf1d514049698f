use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::resource::{
    Pagination, ResourceListQuery, ResourceListResponse, ResourceResponse, UpdateEntryRequest,
};
use crate::models::shared::page_params;
use crate::service::ResourceService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/resources",
    tag = "Admin",
    operation_id = "listResources",
    summary = "List all resources",
    description = "Returns a page of resources in creation order. Password hashes are replaced by `REDACTED`.",
    params(ResourceListQuery),
    responses(
        (status = 200, description = "Page of resources", body = ResourceListResponse),
        (status = 400, description = "Invalid page or limit (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_resources(
    State(state): State<AppState>,
    Query(query): Query<ResourceListQuery>,
) -> Result<Json<ResourceListResponse>, AppError> {
    let (page, limit) = page_params(query.page, query.limit)?;

    let (resources, total) = ResourceService::new(&state.db, &state.uploads)
        .list(page, limit)
        .await?;

    Ok(Json(ResourceListResponse {
        data: resources.into_iter().map(ResourceResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

#[utoipa::path(
    delete,
    path = "/resources/{slug}",
    tag = "Admin",
    operation_id = "deleteResource",
    summary = "Delete a resource",
    description = "Deletes the entry and its link or file row. For files the stored object is removed on a best-effort basis.",
    params(("slug" = String, Path, description = "Resource slug")),
    responses(
        (status = 204, description = "Resource deleted"),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    ResourceService::new(&state.db, &state.uploads)
        .delete_resource(&slug)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/entries/{slug}",
    tag = "Admin",
    operation_id = "updateEntry",
    summary = "Update slug, password or expiry",
    description = "Changes the entry fields shared by links and files. The password is only touched when `update_password` is true.",
    params(("slug" = String, Path, description = "Current resource slug")),
    request_body = UpdateEntryRequest,
    responses(
        (status = 200, description = "Resource updated", body = ResourceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Resource not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "New slug already taken (SLUG_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppJson(payload): AppJson<UpdateEntryRequest>,
) -> Result<Json<ResourceResponse>, AppError> {
    let resource = ResourceService::new(&state.db, &state.uploads)
        .update_entry(&slug, payload.into())
        .await?;
    Ok(Json(resource.into()))
}
