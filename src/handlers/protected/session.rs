// handlers/protected/session.rs - GET /api/auth/session
use axum::Extension;

use crate::auth::Session;
use crate::middleware::{ApiResponse, ApiResult};

/// Returns the snapshot carried by the token, not the stored user: a
/// permission change shows up here only after the next login.
pub async fn session_get(Extension(session): Extension<Session>) -> ApiResult<Session> {
    Ok(ApiResponse::success(session))
}
