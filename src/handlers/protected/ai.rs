// handlers/protected/ai.rs - AI generation endpoints
//
// POST /api/products/:id/research   buffered server-side, one write
// POST /api/products/:id/datasheet  buffered, fences stripped, one write
// POST /api/ai/prompt               streamed to the client as text/plain
use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Session;
use crate::database::models::Product;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Requirement};
use crate::permissions::{blogs, marketing, products};
use crate::services::ContentService;
use crate::state::AppState;

use super::products::PromptRequest;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub input: String,
}

fn content_service(state: &AppState) -> ContentService {
    ContentService::new(state.repo.clone(), state.generator.clone())
}

/// POST /api/products/:id/research - Generate research with web search
///
/// Optional Input (overrides the stored templates):
/// ```json
/// { "prompt": "Compare {brand} {model} with its rivals" }
/// ```
/// Returns the product with `researchData` replaced.
pub async fn research_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Option<Json<PromptRequest>>,
) -> ApiResult<Product> {
    session.require(
        Requirement::AllOf(&[products::RESEARCH]),
        "You do not have permission to research products",
    )?;
    let Path(id) = id?;
    let body = payload.map(|Json(body)| body).unwrap_or_default();

    let product = content_service(&state)
        .research(id, body.prompt.as_deref())
        .await?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products/:id/datasheet - Generate datasheet HTML from research
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "datasheet": "<h1>...</h1>", "product": { ... } }
/// ```
pub async fn datasheet_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    session.require(
        Requirement::AllOf(&[products::DATASHEET]),
        "You do not have permission to generate datasheets",
    )?;
    let Path(id) = id?;
    let (datasheet, product) = content_service(&state).datasheet(id).await?;
    Ok(ApiResponse::success(json!({
        "success": true,
        "datasheet": datasheet,
        "product": product,
    })))
}

/// POST /api/ai/prompt - Stream a free-form generation
///
/// Expected Input:
/// ```json
/// { "input": "Write a tagline for the Acme X1" }
/// ```
/// The body is raw text chunks (`text/plain`), no event envelope. Closing
/// the connection cancels the upstream request.
pub async fn prompt_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    session.require(
        Requirement::AnyOf(&[
            products::RESEARCH,
            products::DATASHEET,
            marketing::CREATE_CAMPAIGNS,
            blogs::CREATE,
        ]),
        "You do not have permission to use AI generation",
    )?;
    let Json(body) = payload?;

    let stream = content_service(&state).prompt_stream(&body.input).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response())
}
