//! Experience Search and Export Routes
//!
//! Every handler runs the filter engine over the full experience list.
//! Export renders the matches as CSV with the visible columns in order.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use worktrail_core::FilterSpec;
use worktrail_storage::{export_experiences_csv, search_experiences};

use crate::{
    extractors::ApiJson,
    error::{ApiError, ApiResult},
    state::SharedStore,
    telemetry::metrics::{record_export, record_search},
    types::{FilterQuery, ListExperiencesResponse, CSV_CONTENT_TYPE, CSV_FILE_NAME},
};

fn csv_response(csv: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
            ),
        ],
        csv,
    )
}

/// GET /api/v1/experiences - List experiences, filtered by query parameters
#[utoipa::path(
    get,
    path = "/api/v1/experiences",
    tag = "Experiences",
    params(
        ("start_date" = Option<String>, Query, description = "Keep experiences starting on or after this date"),
        ("end_date" = Option<String>, Query, description = "Keep ongoing experiences and those ending on or before this date"),
        ("tag_ids" = Option<String>, Query, description = "Comma-separated tag IDs; any match keeps the experience"),
        ("search_term" = Option<String>, Query, description = "Case-insensitive substring over field values and tag names"),
    ),
    responses(
        (status = 200, description = "Matching experiences, newest first", body = ListExperiencesResponse),
    ),
)]
pub async fn list_experiences(
    State(store): State<SharedStore>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<impl IntoResponse> {
    let spec = query.to_filter();
    let found = search_experiences(store.as_ref(), &spec).await?;
    record_search("list", found.len());
    Ok(Json(ListExperiencesResponse::from(found)))
}

/// POST /api/v1/experiences/search - Filter experiences
#[utoipa::path(
    post,
    path = "/api/v1/experiences/search",
    tag = "Experiences",
    request_body = FilterSpec,
    responses(
        (status = 200, description = "Matching experiences, newest first", body = ListExperiencesResponse),
        (status = 400, description = "Malformed JSON body or missing JSON content type", body = ApiError),
    ),
)]
pub async fn search_experiences_handler(
    State(store): State<SharedStore>,
    ApiJson(spec): ApiJson<FilterSpec>,
) -> ApiResult<impl IntoResponse> {
    let found = search_experiences(store.as_ref(), &spec).await?;
    record_search("search", found.len());
    Ok(Json(ListExperiencesResponse::from(found)))
}

/// POST /api/v1/experiences/export - Export filtered experiences as CSV
#[utoipa::path(
    post,
    path = "/api/v1/experiences/export",
    tag = "Experiences",
    request_body = FilterSpec,
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv", body = String),
        (status = 400, description = "Malformed JSON body or missing JSON content type", body = ApiError),
        (status = 500, description = "Rendering failed", body = ApiError),
    ),
)]
pub async fn export_experiences(
    State(store): State<SharedStore>,
    ApiJson(spec): ApiJson<FilterSpec>,
) -> ApiResult<impl IntoResponse> {
    let csv = export_experiences_csv(store.as_ref(), &spec).await?;
    record_export();
    Ok(csv_response(csv))
}

/// GET /api/v1/experiences/export.csv - Download filtered experiences as CSV
#[utoipa::path(
    get,
    path = "/api/v1/experiences/export.csv",
    tag = "Experiences",
    params(
        ("start_date" = Option<String>, Query, description = "Keep experiences starting on or after this date"),
        ("end_date" = Option<String>, Query, description = "Keep ongoing experiences and those ending on or before this date"),
        ("tag_ids" = Option<String>, Query, description = "Comma-separated tag IDs"),
        ("search_term" = Option<String>, Query, description = "Case-insensitive substring"),
    ),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv", body = String),
    ),
)]
pub async fn download_experiences_csv(
    State(store): State<SharedStore>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<impl IntoResponse> {
    let csv = export_experiences_csv(store.as_ref(), &query.to_filter()).await?;
    record_export();
    Ok(csv_response(csv))
}
