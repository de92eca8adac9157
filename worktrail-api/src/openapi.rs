//! OpenAPI Specification for the worktrail API
//!
//! This module defines the OpenAPI document for the worktrail REST API.
//! It uses utoipa to generate the OpenAPI specification from Rust types
//! and route annotations.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus, RecordCounts};
use crate::types::*;

// Import route modules for path references
use crate::routes::{column, experience, health, search, tag};
use crate::telemetry::metrics;

// Import domain types from worktrail-core
use worktrail_core::{Column, ColumnType, EntityType, Experience, ExperienceTag, FilterSpec, MoveDirection, Tag};

/// OpenAPI document for the worktrail API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Worktrail API",
        version = "0.1.0",
        description = "Personal work-experience tracker: user-defined columns, dated experiences, tags, search and CSV export",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Columns", description = "User-defined custom fields and their display order"),
        (name = "Experiences", description = "Dated experience records, search and CSV export"),
        (name = "Tags", description = "Labels attachable to experiences"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Column Routes ===
        column::list_columns,
        column::create_column_handler,
        column::get_column,
        column::update_column_handler,
        column::delete_column_handler,
        column::move_column_handler,

        // === Tag Routes ===
        tag::list_tags,
        tag::create_tag_handler,
        tag::get_tag_handler,
        tag::update_tag_handler,
        tag::delete_tag_handler,

        // === Experience Routes ===
        experience::create_experience_handler,
        experience::get_experience_handler,
        experience::update_experience_handler,
        experience::delete_experience_handler,
        experience::replace_tags,
        experience::link_tag,
        experience::unlink_tag,

        // === Search & Export ===
        search::list_experiences,
        search::search_experiences_handler,
        search::export_experiences,
        search::download_experiences_csv,

        // === Health & Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(
        schemas(
            // Domain types
            Column,
            ColumnType,
            EntityType,
            Experience,
            ExperienceTag,
            FilterSpec,
            MoveDirection,
            Tag,

            // Request / response types
            CreateColumnRequest,
            UpdateColumnRequest,
            MoveColumnRequest,
            ListColumnsResponse,
            CreateTagRequest,
            UpdateTagRequest,
            ListTagsResponse,
            CreateExperienceRequest,
            UpdateExperienceRequest,
            ReplaceTagsRequest,
            ListExperiencesResponse,

            // Health
            HealthResponse,
            HealthStatus,
            HealthDetails,
            ComponentHealth,
            RecordCounts,

            // Errors
            ApiError,
            ErrorCode,
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Worktrail API");
        assert_eq!(openapi.info.version, "0.1.0");
    }

    #[test]
    fn test_openapi_covers_routes() {
        let openapi = ApiDoc::openapi();
        for path in [
            "/api/v1/columns",
            "/api/v1/columns/{id}/move",
            "/api/v1/tags/{id}",
            "/api/v1/experiences",
            "/api/v1/experiences/search",
            "/api/v1/experiences/export.csv",
            "/api/v1/experiences/{id}/tags/{tag_id}",
            "/health/ready",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_openapi_json_serializes() -> Result<(), serde_json::Error> {
        let json = ApiDoc::to_json()?;
        assert!(json.contains("FilterSpec"));
        assert!(json.contains("ListExperiencesResponse"));
        Ok(())
    }
}
