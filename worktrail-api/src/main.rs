//! Worktrail API Server Entry Point
//!
//! Bootstraps configuration, opens the selected store, seeds the starter
//! columns and starts the Axum HTTP server.

use axum::Router;
use worktrail_api::{build_store, create_api_router, ApiConfig, ApiError, ApiResult, AppState};
use worktrail_storage::ensure_default_columns;

use worktrail_api::telemetry::{init_tracer, shutdown_tracer, TelemetryConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    api_config.validate()?;

    let store = build_store(&api_config).await?;
    if api_config.seed_defaults {
        let seeded = ensure_default_columns(store.as_ref()).await?;
        tracing::info!(seeded, "Default columns checked");
    }

    let app: Router = create_api_router(AppState::new(store), &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, storage = %api_config.storage, "Starting worktrail API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    shutdown_tracer();
    Ok(())
}
