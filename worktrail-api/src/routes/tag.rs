//! Tag REST API Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use worktrail_core::Tag;
use worktrail_storage::{create_tag, delete_tag, get_tag, update_tag, ExperienceStore};

use crate::{
    extractors::ApiJson,
    error::{ApiError, ApiResult},
    state::{AppState, SharedStore},
    types::{CreateTagRequest, ListTagsResponse, UpdateTagRequest},
};

/// GET /api/v1/tags - List tags by name
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Tags",
    responses(
        (status = 200, description = "Tags ordered by name", body = ListTagsResponse),
    ),
)]
pub async fn list_tags(State(store): State<SharedStore>) -> ApiResult<impl IntoResponse> {
    let tags = store.tag_list().await?;
    Ok(Json(ListTagsResponse::from(tags)))
}

/// POST /api/v1/tags - Create a tag
#[utoipa::path(
    post,
    path = "/api/v1/tags",
    tag = "Tags",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 400, description = "Malformed body or blank name", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError),
    ),
)]
pub async fn create_tag_handler(
    State(store): State<SharedStore>,
    ApiJson(req): ApiJson<CreateTagRequest>,
) -> ApiResult<impl IntoResponse> {
    let tag = create_tag(store.as_ref(), &req.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// GET /api/v1/tags/{id} - Get a tag
#[utoipa::path(
    get,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag details", body = Tag),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
)]
pub async fn get_tag_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(get_tag(store.as_ref(), id).await?))
}

/// PATCH /api/v1/tags/{id} - Rename a tag
#[utoipa::path(
    patch,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    request_body = UpdateTagRequest,
    responses(
        (status = 200, description = "Tag updated", body = Tag),
        (status = 400, description = "Malformed body or blank name", body = ApiError),
        (status = 404, description = "Tag not found", body = ApiError),
        (status = 409, description = "Name already in use", body = ApiError),
    ),
)]
pub async fn update_tag_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateTagRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(update_tag(store.as_ref(), id, req.into()).await?))
}

/// DELETE /api/v1/tags/{id} - Delete a tag and its links
#[utoipa::path(
    delete,
    path = "/api/v1/tags/{id}",
    tag = "Tags",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 404, description = "Tag not found", body = ApiError),
    ),
)]
pub async fn delete_tag_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    delete_tag(store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the tag routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag_handler))
        .route(
            "/:id",
            get(get_tag_handler)
                .patch(update_tag_handler)
                .delete(delete_tag_handler),
        )
}
