// handlers/protected/system_prompts.rs - /api/system-prompts handlers
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::Session;
use crate::database::models::SystemPrompt;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Requirement};
use crate::permissions::{products, system};
use crate::services::PromptService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptQuery {
    pub system_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSystemPromptRequest {
    #[serde(default)]
    pub system_type: String,
    #[serde(default)]
    pub prompt: String,
}

/// GET /api/system-prompts[?systemType=PRODUCTS]
///
/// Without `systemType` returns every stored template; with it, the one
/// template (404 when absent, except `PRODUCTS`, which is created with the
/// default text on first read).
pub async fn system_prompts_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    query: Result<Query<SystemPromptQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    session.require(
        Requirement::AnyOf(&[
            products::VIEW,
            products::RESEARCH,
            products::DATASHEET,
            system::MANAGE_SETTINGS,
        ]),
        "You do not have permission to view system prompts",
    )?;
    let Query(query) = query?;
    let service = PromptService::new(state.repo);

    let response = match query.system_type.as_deref() {
        Some(system_type) => ApiResponse::success(service.get(system_type).await?).into_response(),
        None => ApiResponse::success(service.list().await?).into_response(),
    };
    Ok(response)
}

/// POST /api/system-prompts - Create or replace the template for a type
///
/// Expected Input:
/// ```json
/// { "systemType": "PRODUCTS", "prompt": "Research {brand} {model} ..." }
/// ```
pub async fn system_prompts_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<UpsertSystemPromptRequest>, JsonRejection>,
) -> ApiResult<SystemPrompt> {
    session.require(
        Requirement::AllOf(&[system::MANAGE_SETTINGS]),
        "You do not have permission to manage system prompts",
    )?;
    let Json(body) = payload?;
    let stored = PromptService::new(state.repo)
        .upsert(&body.system_type, &body.prompt)
        .await?;
    Ok(ApiResponse::success(stored))
}
