//! Worktrail API - REST layer for the work-experience tracker
//!
//! Exposes columns, tags and experiences over Axum, backed by any
//! [`ExperienceStore`](worktrail_storage::ExperienceStore): the PostgreSQL
//! store in [`db`] or the in-memory store from worktrail-storage.

#[macro_use]
mod macros;

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

use std::sync::Arc;

use worktrail_storage::MemoryStore;

// Re-export commonly used types
pub use config::{ApiConfig, StorageBackend};
pub use db::{DbConfig, PgStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extractors::ApiJson;
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::{AppState, SharedStore};
pub use types::*;

/// Open the store selected by `config`.
///
/// The PostgreSQL store has its schema applied before it is returned.
pub async fn build_store(config: &ApiConfig) -> ApiResult<SharedStore> {
    match config.storage {
        StorageBackend::Postgres => {
            let store = PgStore::from_config(&DbConfig::from_env())?;
            store.migrate().await?;
            tracing::info!(pool_size = store.pool_size(), "PostgreSQL store ready");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
