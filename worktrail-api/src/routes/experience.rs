//! Experience REST API Routes
//!
//! CRUD for experiences and their tag links. Listing, search and export
//! live in [`super::search`] and share this router.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use worktrail_core::Experience;
use worktrail_storage::{
    create_experience, delete_experience, get_experience, link_experience_tag,
    replace_experience_tags, unlink_experience_tag, update_experience,
};

use super::search;
use crate::{
    extractors::ApiJson,
    error::{ApiError, ApiResult},
    state::{AppState, SharedStore},
    types::{CreateExperienceRequest, ReplaceTagsRequest, UpdateExperienceRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/experiences - Create an experience
#[utoipa::path(
    post,
    path = "/api/v1/experiences",
    tag = "Experiences",
    request_body = CreateExperienceRequest,
    responses(
        (status = 201, description = "Experience created", body = Experience),
        (status = 400, description = "Malformed body or end date before start date", body = ApiError),
        (status = 404, description = "Unknown tag", body = ApiError),
    ),
)]
pub async fn create_experience_handler(
    State(store): State<SharedStore>,
    ApiJson(req): ApiJson<CreateExperienceRequest>,
) -> ApiResult<impl IntoResponse> {
    let experience = create_experience(store.as_ref(), req.into()).await?;
    Ok((StatusCode::CREATED, Json(experience)))
}

/// GET /api/v1/experiences/{id} - Get an experience with its tags
#[utoipa::path(
    get,
    path = "/api/v1/experiences/{id}",
    tag = "Experiences",
    params(
        ("id" = Uuid, Path, description = "Experience ID")
    ),
    responses(
        (status = 200, description = "Experience details", body = Experience),
        (status = 404, description = "Experience not found", body = ApiError),
    ),
)]
pub async fn get_experience_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(get_experience(store.as_ref(), id).await?))
}

/// PATCH /api/v1/experiences/{id} - Update an experience
#[utoipa::path(
    patch,
    path = "/api/v1/experiences/{id}",
    tag = "Experiences",
    params(
        ("id" = Uuid, Path, description = "Experience ID")
    ),
    request_body = UpdateExperienceRequest,
    responses(
        (status = 200, description = "Experience updated", body = Experience),
        (status = 400, description = "Malformed body or end date before start date", body = ApiError),
        (status = 404, description = "Experience or tag not found", body = ApiError),
    ),
)]
pub async fn update_experience_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateExperienceRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(update_experience(store.as_ref(), id, req.into()).await?))
}

/// DELETE /api/v1/experiences/{id} - Delete an experience
#[utoipa::path(
    delete,
    path = "/api/v1/experiences/{id}",
    tag = "Experiences",
    params(
        ("id" = Uuid, Path, description = "Experience ID")
    ),
    responses(
        (status = 204, description = "Experience deleted"),
        (status = 404, description = "Experience not found", body = ApiError),
    ),
)]
pub async fn delete_experience_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    delete_experience(store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/experiences/{id}/tags - Replace the tag set
#[utoipa::path(
    put,
    path = "/api/v1/experiences/{id}/tags",
    tag = "Experiences",
    params(
        ("id" = Uuid, Path, description = "Experience ID")
    ),
    request_body = ReplaceTagsRequest,
    responses(
        (status = 200, description = "Experience with its new tags", body = Experience),
        (status = 400, description = "Malformed JSON body", body = ApiError),
        (status = 404, description = "Experience or tag not found", body = ApiError),
    ),
)]
pub async fn replace_tags(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<ReplaceTagsRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        replace_experience_tags(store.as_ref(), id, &req.tag_ids).await?,
    ))
}

/// POST /api/v1/experiences/{id}/tags/{tag_id} - Link a tag
#[utoipa::path(
    post,
    path = "/api/v1/experiences/{id}/tags/{tag_id}",
    tag = "Experiences",
    params(
        ("id" = Uuid, Path, description = "Experience ID"),
        ("tag_id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Experience with the tag linked", body = Experience),
        (status = 404, description = "Experience or tag not found", body = ApiError),
    ),
)]
pub async fn link_tag(
    State(store): State<SharedStore>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(link_experience_tag(store.as_ref(), id, tag_id).await?))
}

/// DELETE /api/v1/experiences/{id}/tags/{tag_id} - Unlink a tag
#[utoipa::path(
    delete,
    path = "/api/v1/experiences/{id}/tags/{tag_id}",
    tag = "Experiences",
    params(
        ("id" = Uuid, Path, description = "Experience ID"),
        ("tag_id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Experience without the tag", body = Experience),
        (status = 404, description = "Experience not found", body = ApiError),
    ),
)]
pub async fn unlink_tag(
    State(store): State<SharedStore>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(unlink_experience_tag(store.as_ref(), id, tag_id).await?))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the experience routes router, including search and export.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(search::list_experiences).post(create_experience_handler),
        )
        .route("/search", post(search::search_experiences_handler))
        .route("/export", post(search::export_experiences))
        .route("/export.csv", get(search::download_experiences_csv))
        .route(
            "/:id",
            get(get_experience_handler)
                .patch(update_experience_handler)
                .delete(delete_experience_handler),
        )
        .route("/:id/tags", axum::routing::put(replace_tags))
        .route("/:id/tags/:tag_id", post(link_tag).delete(unlink_tag))
}
