use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected, public};
use crate::middleware::session_middleware;
use crate::state::AppState;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let api = &state.config.api;
    let mut router = Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes));

    if state.config.security.enable_cors {
        router = router.layer(cors_layer(&state.config.security.cors_origins));
    }
    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/logout", post(auth::logout_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{ai, permissions, products, projects, session, system_prompts, users};

    Router::new()
        // Session and catalog
        .route("/api/auth/session", get(session::session_get))
        .route("/api/permissions", get(permissions::permissions_get))
        // Users
        .route("/api/users", get(users::users_get).post(users::users_post))
        .route(
            "/api/users/:id",
            get(users::user_get)
                .patch(users::user_patch)
                .delete(users::user_delete),
        )
        // Products
        .route("/api/products", get(products::products_get).post(products::products_post))
        .route(
            "/api/products/:id",
            get(products::product_get)
                .patch(products::product_patch)
                .delete(products::product_delete),
        )
        .route("/api/products/:id/prompt", patch(products::product_prompt_patch))
        .route("/api/products/:id/research", post(ai::research_post))
        .route(
            "/api/products/:id/datasheet",
            post(ai::datasheet_post).patch(products::product_datasheet_patch),
        )
        // Projects and shared templates
        .route("/api/projects", get(projects::projects_get).post(projects::projects_post))
        .route(
            "/api/system-prompts",
            get(system_prompts::system_prompts_get).post(system_prompts::system_prompts_post),
        )
        // Interactive generation
        .route("/api/ai/prompt", post(ai::prompt_post))
        .route_layer(from_fn_with_state(state, session_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Credentialed requests need explicit origins, methods and headers
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppConfig;
    use crate::database::MemoryRepository;
    use crate::generation::fake::ScriptedGenerator;

    fn router() -> Router {
        let state = AppState::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(ScriptedGenerator::replying(&[])),
            AppConfig::development(),
        )
        .expect("development config has a secret");
        app(state)
    }

    #[tokio::test]
    async fn protected_route_without_session_is_401_json() {
        let response = router()
            .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Not authenticated");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = router()
            .oneshot(Request::get("/api/nothing-here").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let response = router()
            .oneshot(
                Request::options("/api/products")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:5173"))
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            Some(&HeaderValue::from_static("true"))
        );
    }
}
