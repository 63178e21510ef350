use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scanner_core::{Library, TaskType};
use scanner_library::catalog::FileSelector;
use scanner_library::pipelines;
use scanner_library::tasks::Task;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::auth::{AdminUser, AuthError};
use crate::AppState;

#[derive(Serialize)]
pub struct AcceptedResponse {
    message: String,
}

fn accepted(message: impl Into<String>) -> Response {
    (StatusCode::ACCEPTED, Json(AcceptedResponse { message: message.into() })).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message.into() }))).into_response()
}

/// Resolves a path param that may be either a library slug or its
/// numeric catalog id, per §6's "slug/id" route spec.
async fn resolve_library(state: &AppState, library_id: &str) -> Result<Library, Response> {
    let libraries = state.ctx.catalog.get_all_libraries().await.map_err(|_| AuthError::CatalogUnavailable.into_response())?;
    libraries
        .into_iter()
        .find(|l| l.slug == library_id || library_id.parse::<i64>().map(|id| id == l.id).unwrap_or(false))
        .ok_or_else(|| bad_request(format!("no library matching '{library_id}'")))
}

fn enqueue_scan(engine: &std::sync::Arc<scanner_library::tasks::TaskEngine>, ctx: scanner_library::PipelineContext, library: Library) {
    let task = Task {
        id: Uuid::new_v4().to_string(),
        name: format!("scan:{}", library.slug),
        library_id: Some(library.id),
        task_type: TaskType::Scan,
        action: Box::new(move |engine| {
            Box::pin(async move {
                if let Err(e) = pipelines::run_scan(&ctx, &engine, &library).await {
                    tracing::error!(error = %e, "scan failed");
                }
            })
        }),
    };
    let engine = std::sync::Arc::clone(engine);
    tokio::spawn(async move {
        engine.add_task_if_none_equivalent(task).await;
    });
}

fn enqueue_clean(engine: &std::sync::Arc<scanner_library::tasks::TaskEngine>, ctx: scanner_library::PipelineContext, library: Library) {
    let task = Task {
        id: Uuid::new_v4().to_string(),
        name: format!("clean:{}", library.slug),
        library_id: Some(library.id),
        task_type: TaskType::Clean,
        action: Box::new(move |engine| {
            Box::pin(async move {
                if let Err(e) = pipelines::run_clean(&ctx, &engine, &library).await {
                    tracing::error!(error = %e, "clean failed");
                }
            })
        }),
    };
    let engine = std::sync::Arc::clone(engine);
    tokio::spawn(async move {
        engine.add_task_if_none_equivalent(task).await;
    });
}

/// POST /scan — enqueues a Scan for every known library.
pub async fn scan(_admin: AdminUser, State(state): State<AppState>) -> Result<Response, AuthError> {
    let libraries = state.ctx.catalog.get_all_libraries().await.map_err(|_| AuthError::CatalogUnavailable)?;
    for library in libraries {
        enqueue_scan(&state.engine, state.ctx.clone(), library);
    }
    Ok(accepted("scan enqueued"))
}

/// POST /scan/:library_id
pub async fn scan_library(_admin: AdminUser, State(state): State<AppState>, Path(library_id): Path<String>) -> Response {
    let library = match resolve_library(&state, &library_id).await {
        Ok(library) => library,
        Err(response) => return response,
    };
    enqueue_scan(&state.engine, state.ctx.clone(), library);
    accepted("scan enqueued")
}

/// POST /clean — enqueues a Clean for every known library.
pub async fn clean(_admin: AdminUser, State(state): State<AppState>) -> Result<Response, AuthError> {
    let libraries = state.ctx.catalog.get_all_libraries().await.map_err(|_| AuthError::CatalogUnavailable)?;
    for library in libraries {
        enqueue_clean(&state.engine, state.ctx.clone(), library);
    }
    Ok(accepted("clean enqueued"))
}

/// POST /clean/:library_id
pub async fn clean_library(_admin: AdminUser, State(state): State<AppState>, Path(library_id): Path<String>) -> Response {
    let library = match resolve_library(&state, &library_id).await {
        Ok(library) => library,
        Err(response) => return response,
    };
    enqueue_clean(&state.engine, state.ctx.clone(), library);
    accepted("clean enqueued")
}

#[derive(Deserialize)]
pub struct RefreshQuery {
    library: Option<String>,
    album: Option<String>,
    release: Option<String>,
    song: Option<String>,
    track: Option<String>,
    force: Option<bool>,
}

/// POST /refresh — query must name exactly one selector, per §9 Open
/// Question (b): enforced here at the edge, not inside the pipeline.
pub async fn refresh(_admin: AdminUser, State(state): State<AppState>, Query(query): Query<RefreshQuery>) -> Response {
    let selector = FileSelector {
        library: query.library,
        album: query.album,
        release: query.release,
        song: query.song,
        track: query.track,
    };
    let set_count = [&selector.library, &selector.album, &selector.release, &selector.song, &selector.track].iter().filter(|v| v.is_some()).count();
    if set_count != 1 {
        return bad_request("refresh requires exactly one of library, album, release, song, track");
    }
    let force = query.force.unwrap_or(false);

    let ctx = state.ctx.clone();
    let engine = std::sync::Arc::clone(&state.engine);
    let name = format!("refresh:{selector:?}");
    let task = Task {
        id: Uuid::new_v4().to_string(),
        name,
        library_id: None,
        task_type: TaskType::Refresh,
        action: Box::new(move |engine| {
            Box::pin(async move {
                if let Err(e) = pipelines::run_refresh(&ctx, &engine, selector, force).await {
                    tracing::error!(error = %e, "refresh failed");
                }
            })
        }),
    };
    engine.add_task_if_none_equivalent(task).await;
    accepted("refresh enqueued")
}
