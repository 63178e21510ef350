use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::AppState;

/// Proof that the request carried a valid admin bearer token, checked
/// against the catalog's `/users/me` before the handler body runs.
pub struct AdminUser;

pub enum AuthError {
    Missing,
    Invalid,
    CatalogUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Missing | AuthError::Invalid => (StatusCode::UNAUTHORIZED, "admin authentication required"),
            AuthError::CatalogUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "catalog unavailable"),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok()).ok_or(AuthError::Missing)?;
        let token = header.strip_prefix("Bearer ").ok_or(AuthError::Missing)?;

        let user = state.ctx.catalog.get_user_from_access_token(token).await.map_err(|e| match e {
            scanner_library::catalog::CatalogError::Http { status, .. } if status == 401 || status == 403 => AuthError::Invalid,
            scanner_library::catalog::CatalogError::Http { .. } => AuthError::CatalogUnavailable,
            scanner_library::catalog::CatalogError::Transport(_) => AuthError::CatalogUnavailable,
        })?;

        if !user.admin {
            return Err(AuthError::Invalid);
        }
        Ok(AdminUser)
    }
}
