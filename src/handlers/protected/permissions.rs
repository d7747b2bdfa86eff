// handlers/protected/permissions.rs - GET /api/permissions
use axum::Extension;
use serde::Serialize;

use crate::auth::Session;
use crate::middleware::{ApiResponse, ApiResult};
use crate::permissions::{list_all_permissions, PermissionGroup, PERMISSION_GROUPS};

#[derive(Debug, Serialize)]
pub struct PermissionCatalog {
    pub groups: &'static [PermissionGroup],
    pub all: Vec<&'static str>,
    /// What the caller's session holds, for UI gating.
    pub granted: Vec<String>,
}

pub async fn permissions_get(Extension(session): Extension<Session>) -> ApiResult<PermissionCatalog> {
    Ok(ApiResponse::success(PermissionCatalog {
        groups: PERMISSION_GROUPS,
        all: list_all_permissions().into_iter().collect(),
        granted: session.permissions.to_vec(),
    }))
}
