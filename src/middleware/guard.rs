// Per-endpoint permission checks against the session snapshot
use uuid::Uuid;

use crate::auth::Session;
use crate::error::ApiError;
use crate::permissions::PermissionSet;

/// How an endpoint combines its required permissions.
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// Passes when the caller holds at least one of the listed permissions.
    AnyOf(&'static [&'static str]),
    /// Passes when the caller holds every listed permission.
    AllOf(&'static [&'static str]),
}

impl Requirement {
    pub fn is_satisfied_by(&self, permissions: &PermissionSet) -> bool {
        match self {
            Requirement::AnyOf(required) => permissions.has_any(required),
            Requirement::AllOf(required) => permissions.has_all(required),
        }
    }
}

impl Session {
    /// Forbidden with `reason` unless the snapshot satisfies `requirement`.
    pub fn require(&self, requirement: Requirement, reason: &str) -> Result<(), ApiError> {
        if requirement.is_satisfied_by(&self.permissions) {
            return Ok(());
        }
        tracing::warn!(user_id = %self.user_id, ?requirement, "Permission denied: {}", reason);
        Err(ApiError::forbidden(reason))
    }

    /// Forbidden with `reason` when `target` is the caller's own account.
    pub fn require_not_self(&self, target: Uuid, reason: &str) -> Result<(), ApiError> {
        if self.user_id != target {
            return Ok(());
        }
        tracing::warn!(user_id = %self.user_id, "Self action refused: {}", reason);
        Err(ApiError::forbidden(reason))
    }
}
