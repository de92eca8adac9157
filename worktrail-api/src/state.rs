//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use worktrail_storage::ExperienceStore;

/// The store every route works against. Postgres in production, memory in
/// tests and local runs.
pub type SharedStore = Arc<dyn ExperienceStore>;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(SharedStore, store);
crate::impl_from_ref!(Instant, start_time);
