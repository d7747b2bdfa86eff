// handlers/public/auth.rs - POST /api/auth/login and POST /api/auth/logout
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::services::UserService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/auth/login - Check credentials and open a session
///
/// Expected Input:
/// ```json
/// { "email": "ana@example.com", "password": "secret" }
/// ```
///
/// Expected Output (Success): sets the session cookie and returns
/// ```json
/// {
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "user": { "id": "...", "email": "ana@example.com", "name": "Ana", "permissions": ["products:view"], ... },
///   "expires_at": "2026-11-15T10:00:00Z"
/// }
/// ```
///
/// Unknown email and wrong password both answer 401 with the same message.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = UserService::new(state.repo.clone())
        .authenticate(&body.email, &body.password, state.config.security.legacy_permission_policy)
        .await?;
    let issued = state.keys.issue(&user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    let cookie = session_cookie(&state.config.security, &issued.token, state.keys.ttl());
    let body = LoginResponse {
        token: issued.token,
        expires_at: issued.session.expires_at,
        user,
    };
    Ok(([(header::SET_COOKIE, cookie)], ApiResponse::success(body)).into_response())
}

/// POST /api/auth/logout - Clear the session cookie
///
/// Tokens are stateless, so a copied token stays valid until it expires.
pub async fn logout_post(State(state): State<AppState>) -> Response {
    let cookie = session_cookie(&state.config.security, "", Duration::zero());
    ([(header::SET_COOKIE, cookie)], ApiResponse::success(json!({ "success": true }))).into_response()
}

/// `Set-Cookie` value for the session. A zero `max_age` expires it.
pub fn session_cookie(security: &SecurityConfig, token: &str, max_age: Duration) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        security.session_cookie_name,
        token,
        max_age.num_seconds().max(0)
    );
    if security.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn cookie_attributes() {
        let mut security = AppConfig::development().security;
        let cookie = session_cookie(&security, "tok", Duration::hours(1));
        assert_eq!(cookie, "session_token=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");

        security.secure_cookie = true;
        let cleared = session_cookie(&security, "", Duration::zero());
        assert_eq!(cleared, "session_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure");
    }
}
