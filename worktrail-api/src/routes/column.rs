//! Column REST API Routes
//!
//! Custom field definitions: CRUD plus one-slot moves in display order.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use worktrail_core::Column;
use worktrail_storage::{create_column, delete_column, move_column, update_column, ExperienceStore};

use crate::{
    extractors::ApiJson,
    error::{ApiError, ApiResult},
    state::{AppState, SharedStore},
    types::{CreateColumnRequest, ListColumnsResponse, MoveColumnRequest, UpdateColumnRequest},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /api/v1/columns - List columns in display order
#[utoipa::path(
    get,
    path = "/api/v1/columns",
    tag = "Columns",
    responses(
        (status = 200, description = "Columns ordered by `order`", body = ListColumnsResponse),
    ),
)]
pub async fn list_columns(State(store): State<SharedStore>) -> ApiResult<impl IntoResponse> {
    let columns = store.column_list().await?;
    Ok(Json(ListColumnsResponse::from(columns)))
}

/// POST /api/v1/columns - Create a column
#[utoipa::path(
    post,
    path = "/api/v1/columns",
    tag = "Columns",
    request_body = CreateColumnRequest,
    responses(
        (status = 201, description = "Column created", body = Column),
        (status = 400, description = "Malformed body or invalid column definition", body = ApiError),
        (status = 409, description = "Key already in use", body = ApiError),
    ),
)]
pub async fn create_column_handler(
    State(store): State<SharedStore>,
    ApiJson(req): ApiJson<CreateColumnRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(ApiError::missing_field("name"));
    }
    let column = create_column(store.as_ref(), req.into()).await?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// GET /api/v1/columns/{id} - Get a column
#[utoipa::path(
    get,
    path = "/api/v1/columns/{id}",
    tag = "Columns",
    params(
        ("id" = Uuid, Path, description = "Column ID")
    ),
    responses(
        (status = 200, description = "Column details", body = Column),
        (status = 404, description = "Column not found", body = ApiError),
    ),
)]
pub async fn get_column(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let column = store
        .column_get(id)
        .await?
        .ok_or_else(|| ApiError::entity_not_found("Column", id))?;
    Ok(Json(column))
}

/// PATCH /api/v1/columns/{id} - Update a column
#[utoipa::path(
    patch,
    path = "/api/v1/columns/{id}",
    tag = "Columns",
    params(
        ("id" = Uuid, Path, description = "Column ID")
    ),
    request_body = UpdateColumnRequest,
    responses(
        (status = 200, description = "Column updated", body = Column),
        (status = 400, description = "Malformed body or invalid column definition", body = ApiError),
        (status = 404, description = "Column not found", body = ApiError),
        (status = 409, description = "Key already in use", body = ApiError),
    ),
)]
pub async fn update_column_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateColumnRequest>,
) -> ApiResult<impl IntoResponse> {
    let column = update_column(store.as_ref(), id, req.into()).await?;
    Ok(Json(column))
}

/// DELETE /api/v1/columns/{id} - Delete a column
#[utoipa::path(
    delete,
    path = "/api/v1/columns/{id}",
    tag = "Columns",
    params(
        ("id" = Uuid, Path, description = "Column ID")
    ),
    responses(
        (status = 204, description = "Column deleted"),
        (status = 404, description = "Column not found", body = ApiError),
    ),
)]
pub async fn delete_column_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    delete_column(store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/columns/{id}/move - Move a column one slot up or down
#[utoipa::path(
    post,
    path = "/api/v1/columns/{id}/move",
    tag = "Columns",
    params(
        ("id" = Uuid, Path, description = "Column ID")
    ),
    request_body = MoveColumnRequest,
    responses(
        (status = 200, description = "Columns after the move", body = ListColumnsResponse),
        (status = 400, description = "Malformed JSON body", body = ApiError),
        (status = 404, description = "Column not found", body = ApiError),
    ),
)]
pub async fn move_column_handler(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<MoveColumnRequest>,
) -> ApiResult<impl IntoResponse> {
    let columns = move_column(store.as_ref(), id, req.direction).await?;
    Ok(Json(ListColumnsResponse::from(columns)))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the column routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_columns).post(create_column_handler))
        .route(
            "/:id",
            get(get_column)
                .patch(update_column_handler)
                .delete(delete_column_handler),
        )
        .route("/:id/move", post(move_column_handler))
}
