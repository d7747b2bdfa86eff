// handlers/protected/projects.rs - /api/projects handlers
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::auth::Session;
use crate::database::models::Project;
use crate::middleware::{ApiResponse, ApiResult, Requirement};
use crate::permissions::system;
use crate::services::{CreateProjectRequest, ProjectService};
use crate::state::AppState;

/// GET /api/projects - Own projects for settings managers, public ones otherwise
pub async fn projects_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Vec<Project>> {
    Ok(ApiResponse::success(ProjectService::new(state.repo).list(&session).await?))
}

/// POST /api/projects
///
/// Expected Input:
/// ```json
/// {
///   "name": "Spring launch",
///   "description": "Copy for the spring catalogue",
///   "tags": ["spring"],
///   "availableVariables": ["brand", "model"],
///   "responseMode": "PROMPT"
/// }
/// ```
pub async fn projects_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> ApiResult<Project> {
    session.require(
        Requirement::AllOf(&[system::MANAGE_SETTINGS]),
        "You do not have permission to create projects",
    )?;
    let Json(body) = payload?;
    let project = ProjectService::new(state.repo).create(&session, body).await?;
    Ok(ApiResponse::created(project))
}
