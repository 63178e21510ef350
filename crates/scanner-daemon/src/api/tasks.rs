use axum::extract::State;
use axum::Json;
use scanner_core::TaskInfo;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct TasksResponse {
    current_task: Option<TaskInfo>,
    progress: u8,
    pending_tasks: Vec<TaskInfo>,
}

/// GET /tasks — no auth. Nulls/empty when the engine is idle.
pub async fn tasks(State(state): State<AppState>) -> Json<TasksResponse> {
    let (current_task, progress, pending_tasks) = state.engine.current_tasks().await;
    Json(TasksResponse { current_task, progress, pending_tasks })
}
