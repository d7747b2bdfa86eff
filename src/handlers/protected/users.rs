// handlers/protected/users.rs - /api/users and /api/users/:id handlers
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Session;
use crate::database::models::{User, UserSummary};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Requirement};
use crate::permissions::users;
use crate::services::{CreateUserRequest, UserService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    pub permissions: Option<Vec<String>>,
}

/// GET /api/users - All users, newest first, with their project count
pub async fn users_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Vec<UserSummary>> {
    session.require(
        Requirement::AllOf(&[users::VIEW]),
        "You do not have permission to view the user list",
    )?;
    Ok(ApiResponse::success(UserService::new(state.repo).list().await?))
}

/// POST /api/users - Create an account
///
/// Expected Input:
/// ```json
/// {
///   "email": "lu@example.com",
///   "password": "at-least-6",
///   "name": "Lu",
///   "permissions": ["products:view", "products:research"]
/// }
/// ```
///
/// Returns 201 with the stored user. 409 when the email is taken.
pub async fn users_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    session.require(
        Requirement::AllOf(&[users::CREATE]),
        "You do not have permission to create users",
    )?;
    let Json(body) = payload?;
    let user = UserService::new(state.repo).create(body).await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/users/:id
pub async fn user_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<UserSummary> {
    session.require(
        Requirement::AllOf(&[users::VIEW]),
        "You do not have permission to view users",
    )?;
    let Path(id) = id?;
    Ok(ApiResponse::success(UserService::new(state.repo).get(id).await?))
}

/// PATCH /api/users/:id - Replace a user's permission set
///
/// Expected Input:
/// ```json
/// { "permissions": ["products:view", "users:view"] }
/// ```
///
/// Refused for the caller's own account. Any unknown identifier rejects the
/// whole batch.
pub async fn user_patch(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePermissionsRequest>, JsonRejection>,
) -> ApiResult<User> {
    session.require(
        Requirement::AllOf(&[users::MANAGE_PERMISSIONS]),
        "You do not have permission to manage user permissions",
    )?;
    let Path(id) = id?;
    session.require_not_self(id, "You cannot modify your own permissions")?;

    let Json(body) = payload?;
    let permissions = body
        .permissions
        .ok_or_else(|| ApiError::validation("Permissions must be an array"))?;

    let user = UserService::new(state.repo).set_permissions(id, permissions).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id
///
/// Refused for the caller's own account, checked before the lookup.
pub async fn user_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    session.require(
        Requirement::AllOf(&[users::DELETE]),
        "You do not have permission to delete users",
    )?;
    let Path(id) = id?;
    session.require_not_self(id, "You cannot delete your own account")?;

    UserService::new(state.repo).delete(id).await?;
    Ok(ApiResponse::success(json!({ "success": true })))
}
