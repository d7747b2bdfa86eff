use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Session middleware: resolves the caller from the session cookie or a
/// Bearer header and inserts the [`Session`](crate::auth::Session) into the
/// request extensions. Missing or invalid tokens stop the request with 401.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &state.config.security.session_cookie_name)
        .ok_or_else(|| ApiError::unauthenticated("Not authenticated"))?;

    let session = state.keys.verify(&token)?;
    tracing::debug!(user_id = %session.user_id, "Session validated");

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Bearer header first, then the named cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, cookie_name))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session_token=abc.def; x=1"));
        assert_eq!(extract_token(&headers, "session_token").as_deref(), Some("abc.def"));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token=cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer header"));
        assert_eq!(extract_token(&headers, "session_token").as_deref(), Some("header"));
    }

    #[test]
    fn empty_or_foreign_credentials_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(extract_token(&headers, "session_token"), None);
    }
}
