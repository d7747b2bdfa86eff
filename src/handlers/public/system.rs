// handlers/public/system.rs - GET / and GET /health
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Product Admin API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Permission-gated product records with AI research and datasheet generation",
        "endpoints": {
            "auth": "/api/auth/login, /api/auth/logout (public); /api/auth/session (session)",
            "permissions": "/api/permissions (session)",
            "users": "/api/users[/:id] (users:*)",
            "products": "/api/products[/:id[/prompt|/research|/datasheet]] (products:*)",
            "projects": "/api/projects (session)",
            "system_prompts": "/api/system-prompts (session)",
            "ai": "/api/ai/prompt (streaming, session)",
            "health": "/health (public)"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repo.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "error": "database unavailable"
                })),
            )
        }
    }
}
