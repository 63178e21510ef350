use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct LivenessResponse {
    pub message: String,
    pub version: String,
}

/// GET / — liveness + version, no auth.
pub async fn root(State(state): State<AppState>) -> Json<LivenessResponse> {
    Json(LivenessResponse { message: "scanner is running".to_string(), version: state.version })
}
