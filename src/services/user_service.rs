use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, PasswordError, MIN_PASSWORD_LEN};
use crate::config::LegacyPermissionPolicy;
use crate::database::models::{CreateUser, User, UserSummary};
use crate::database::Repository;
use crate::error::ApiError;
use crate::permissions::{invalid_permissions, permissions_for_default_role, LegacyRole};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub permissions: Option<Vec<String>>,
}

/// Account management and credential checks.
pub struct UserService {
    repo: Arc<dyn Repository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, ApiError> {
        Ok(self.repo.list_users().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<UserSummary, ApiError> {
        self.repo
            .find_user_summary(id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<User, ApiError> {
        let permissions = validate_new_user(&request)?;

        if self.repo.find_user_by_email(&request.email).await?.is_some() {
            return Err(ApiError::conflict("A user with this email already exists"));
        }

        let password_hash = hash_password(&request.password)?;
        let user = self
            .repo
            .create_user(CreateUser {
                email: request.email,
                name: request.name,
                password_hash,
                permissions,
            })
            .await?;

        tracing::info!(user_id = %user.id, permissions = user.permissions.len(), "User created");
        Ok(user)
    }

    /// Replaces the permission set. The whole batch is rejected when any
    /// entry is not a registry permission.
    pub async fn set_permissions(&self, id: Uuid, permissions: Vec<String>) -> Result<User, ApiError> {
        let invalid = invalid_permissions(&permissions);
        if !invalid.is_empty() {
            return Err(ApiError::validation(format!(
                "Invalid permissions: {}",
                invalid.join(", ")
            )));
        }

        let user = self
            .repo
            .set_user_permissions(id, dedup(permissions))
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        tracing::info!(user_id = %user.id, permissions = ?user.permissions, "User permissions updated");
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.repo.delete_user(id).await? {
            return Err(ApiError::not_found("User not found"));
        }
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Checks credentials and applies the legacy permission policy to
    /// accounts that still have an empty permission set.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        policy: LegacyPermissionPolicy,
    ) -> Result<User, ApiError> {
        let Some(user) = self.repo.find_user_by_email(email.trim()).await? else {
            tracing::warn!("Login failed: unknown email");
            return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(user_id = %user.id, "Login failed: wrong password");
                return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
            }
            Err(PasswordError::MalformedHash(e)) => {
                tracing::error!(user_id = %user.id, "Stored password hash is unreadable: {}", e);
                return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
            }
            Err(e) => return Err(e.into()),
        }

        if !user.permissions.is_empty() || policy == LegacyPermissionPolicy::KeepEmpty {
            return Ok(user);
        }

        let all: Vec<String> = permissions_for_default_role(LegacyRole::Admin)
            .into_iter()
            .map(String::from)
            .collect();
        let granted = all.len();

        // Best effort: the session gets the full set even if the write fails
        let migrated = match self.repo.set_user_permissions(user.id, all.clone()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::error!(user_id = %user.id, "Permission backfill found no row to update");
                User { permissions: all, ..user }
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, "Permission backfill failed: {}", e);
                User { permissions: all, ..user }
            }
        };

        tracing::info!(
            user_id = %migrated.id,
            permissions = granted,
            "Legacy account without permissions migrated to the full permission set"
        );
        Ok(migrated)
    }
}

/// Validates a create request and returns its de-duplicated permission list.
pub fn validate_new_user(request: &CreateUserRequest) -> Result<Vec<String>, ApiError> {
    let permissions = match &request.permissions {
        Some(p) => p,
        None => return Err(ApiError::validation("All fields are required")),
    };
    if request.email.is_empty() || request.password.is_empty() || request.name.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }
    if !is_valid_email(&request.email) {
        return Err(ApiError::validation("Invalid email format"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    if permissions.is_empty() {
        return Err(ApiError::validation("At least one permission is required"));
    }
    let invalid = invalid_permissions(permissions);
    if !invalid.is_empty() {
        return Err(ApiError::validation(format!(
            "Invalid permissions: {}",
            invalid.join(", ")
        )));
    }
    Ok(dedup(permissions.clone()))
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain
/// with text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

// Keeps first occurrence order
fn dedup(permissions: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    permissions
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::database::models::{
        CreateProduct, CreateProject, Product, Project, ProjectScope, SystemPrompt, SystemType,
        UpdateProduct,
    };
    use crate::database::{DatabaseError, MemoryRepository};
    use crate::permissions::{list_all_permissions, products, PermissionSet};

    /// Memory store whose permission writes always fail.
    struct ReadOnlyPermissions(MemoryRepository);

    #[async_trait]
    impl Repository for ReadOnlyPermissions {
        async fn health_check(&self) -> Result<(), DatabaseError> {
            self.0.health_check().await
        }
        async fn create_user(&self, input: CreateUser) -> Result<User, DatabaseError> {
            self.0.create_user(input).await
        }
        async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
            self.0.find_user(id).await
        }
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
            self.0.find_user_by_email(email).await
        }
        async fn find_user_summary(&self, id: Uuid) -> Result<Option<UserSummary>, DatabaseError> {
            self.0.find_user_summary(id).await
        }
        async fn list_users(&self) -> Result<Vec<UserSummary>, DatabaseError> {
            self.0.list_users().await
        }
        async fn set_user_permissions(
            &self,
            _id: Uuid,
            _permissions: Vec<String>,
        ) -> Result<Option<User>, DatabaseError> {
            Err(DatabaseError::QueryError("connection reset".into()))
        }
        async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
            self.0.delete_user(id).await
        }
        async fn list_products(&self) -> Result<Vec<Product>, DatabaseError> {
            self.0.list_products().await
        }
        async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
            self.0.find_product(id).await
        }
        async fn create_product(&self, input: CreateProduct) -> Result<Product, DatabaseError> {
            self.0.create_product(input).await
        }
        async fn update_product(
            &self,
            id: Uuid,
            patch: UpdateProduct,
        ) -> Result<Option<Product>, DatabaseError> {
            self.0.update_product(id, patch).await
        }
        async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError> {
            self.0.delete_product(id).await
        }
        async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, DatabaseError> {
            self.0.list_projects(scope).await
        }
        async fn create_project(&self, input: CreateProject) -> Result<Project, DatabaseError> {
            self.0.create_project(input).await
        }
        async fn find_system_prompt(
            &self,
            system_type: SystemType,
        ) -> Result<Option<SystemPrompt>, DatabaseError> {
            self.0.find_system_prompt(system_type).await
        }
        async fn list_system_prompts(&self) -> Result<Vec<SystemPrompt>, DatabaseError> {
            self.0.list_system_prompts().await
        }
        async fn upsert_system_prompt(
            &self,
            system_type: SystemType,
            prompt: String,
        ) -> Result<SystemPrompt, DatabaseError> {
            self.0.upsert_system_prompt(system_type, prompt).await
        }
        async fn insert_system_prompt_if_absent(
            &self,
            system_type: SystemType,
            prompt: String,
        ) -> Result<SystemPrompt, DatabaseError> {
            self.0.insert_system_prompt_if_absent(system_type, prompt).await
        }
    }

    fn request(email: &str, password: &str, permissions: Option<Vec<&str>>) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            password: password.into(),
            name: "Lu".into(),
            permissions: permissions.map(|p| p.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.b"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.io"));
    }

    #[test]
    fn create_request_validation_order() {
        let missing = request("a@b.co", "secret", None);
        assert_eq!(validate_new_user(&missing).unwrap_err().message(), "All fields are required");

        let short = request("a@b.co", "12345", Some(vec![products::VIEW]));
        assert!(validate_new_user(&short).unwrap_err().message().contains("at least 6"));

        let empty = request("a@b.co", "123456", Some(vec![]));
        assert_eq!(
            validate_new_user(&empty).unwrap_err().message(),
            "At least one permission is required"
        );

        let bogus = request("a@b.co", "123456", Some(vec![products::VIEW, "products:fly"]));
        assert_eq!(
            validate_new_user(&bogus).unwrap_err().message(),
            "Invalid permissions: products:fly"
        );
    }

    #[test]
    fn duplicate_permissions_collapse() {
        let req = request("a@b.co", "123456", Some(vec![products::VIEW, products::VIEW, products::EDIT]));
        assert_eq!(validate_new_user(&req).unwrap(), vec![products::VIEW, products::EDIT]);
    }

    #[tokio::test]
    async fn invalid_batch_leaves_permissions_untouched() {
        let repo = Arc::new(MemoryRepository::new());
        let service = UserService::new(repo.clone());
        let user = service
            .create(request("a@b.co", "123456", Some(vec![products::VIEW])))
            .await
            .unwrap();

        let err = service
            .set_permissions(user.id, vec![products::EDIT.into(), "nope".into()])
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        let stored = repo.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.permissions, vec![products::VIEW.to_string()]);
    }

    #[tokio::test]
    async fn legacy_account_policy() {
        let repo = Arc::new(MemoryRepository::new());
        let service = UserService::new(repo.clone());
        repo.create_user(CreateUser {
            email: "old@example.com".into(),
            name: "Old".into(),
            password_hash: hash_password("hunter22").unwrap(),
            permissions: vec![],
        })
        .await
        .unwrap();

        let kept = service
            .authenticate("old@example.com", "hunter22", LegacyPermissionPolicy::KeepEmpty)
            .await
            .unwrap();
        assert!(kept.permissions.is_empty());

        let migrated = service
            .authenticate("old@example.com", "hunter22", LegacyPermissionPolicy::GrantAll)
            .await
            .unwrap();
        assert_eq!(migrated.permissions.len(), list_all_permissions().len());

        let stored = repo.find_user_by_email("old@example.com").await.unwrap().unwrap();
        assert_eq!(stored.permissions.len(), list_all_permissions().len());
    }

    #[tokio::test]
    async fn failed_backfill_still_logs_in_with_full_set() {
        let repo = Arc::new(ReadOnlyPermissions(MemoryRepository::new()));
        let service = UserService::new(repo.clone());
        repo.create_user(CreateUser {
            email: "old@example.com".into(),
            name: "Old".into(),
            password_hash: hash_password("hunter22").unwrap(),
            permissions: vec![],
        })
        .await
        .unwrap();

        let user = service
            .authenticate("old@example.com", "hunter22", LegacyPermissionPolicy::GrantAll)
            .await
            .unwrap();
        assert_eq!(user.permissions.len(), 24);
        assert_eq!(user.permission_set(), list_all_permissions().into_iter().collect::<PermissionSet>());

        // Nothing was persisted, so the next login migrates again
        let stored = repo.find_user_by_email("old@example.com").await.unwrap().unwrap();
        assert!(stored.permissions.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let repo = Arc::new(MemoryRepository::new());
        let service = UserService::new(repo);
        service
            .create(request("a@b.co", "123456", Some(vec![products::VIEW])))
            .await
            .unwrap();

        let wrong = service
            .authenticate("a@b.co", "654321", LegacyPermissionPolicy::GrantAll)
            .await
            .unwrap_err();
        let unknown = service
            .authenticate("z@b.co", "123456", LegacyPermissionPolicy::GrantAll)
            .await
            .unwrap_err();
        assert_eq!(wrong.message(), unknown.message());
        assert_eq!(wrong.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
