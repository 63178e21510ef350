use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use scanner_library::tasks::TaskEngine;
use scanner_library::PipelineContext;
use tower_http::trace::TraceLayer;

pub mod api;

/// Handler-visible application state, shared behind `Arc` clones of its
/// own fields rather than wrapped in an outer `Arc<AppState>` — every
/// field is already cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub ctx: PipelineContext,
    pub engine: Arc<TaskEngine>,
    pub version: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/tasks", get(api::tasks))
        .route("/scan", post(api::scan))
        .route("/scan/:library_id", post(api::scan_library))
        .route("/clean", post(api::clean))
        .route("/clean/:library_id", post(api::clean_library))
        .route("/refresh", post(api::refresh))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
