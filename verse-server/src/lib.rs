//! verse-server library
//!
//! JSON HTTP API over the file-backed poem and progress store. All routes
//! live under `/api`.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod store;

pub use store::JsonStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
}

impl AppState {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(api::health_routes())
        .merge(api::poem_routes())
        .merge(api::progress_routes());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
