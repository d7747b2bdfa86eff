use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CreateProduct, CreateProject, CreateUser, Product, Project, ProjectScope, SystemPrompt,
    SystemType, UpdateProduct, User, UserSummary,
};

/// The persistence contract: one call per operation, keyed by record id.
///
/// Lookups return `Ok(None)` / `Ok(false)` for missing records and leave the
/// NotFound decision to the caller. A uniqueness violation surfaces as
/// [`DatabaseError::Conflict`]. Listings are complete and ordered newest first.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Users
    async fn create_user(&self, input: CreateUser) -> Result<User, DatabaseError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;
    async fn find_user_summary(&self, id: Uuid) -> Result<Option<UserSummary>, DatabaseError>;
    /// Ordered by `created_at` descending.
    async fn list_users(&self) -> Result<Vec<UserSummary>, DatabaseError>;
    /// Replaces the whole permission set.
    async fn set_user_permissions(
        &self,
        id: Uuid,
        permissions: Vec<String>,
    ) -> Result<Option<User>, DatabaseError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError>;

    // Products
    /// Ordered by `created_at` descending.
    async fn list_products(&self) -> Result<Vec<Product>, DatabaseError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError>;
    async fn create_product(&self, input: CreateProduct) -> Result<Product, DatabaseError>;
    async fn update_product(
        &self,
        id: Uuid,
        patch: UpdateProduct,
    ) -> Result<Option<Product>, DatabaseError>;
    async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError>;

    // Projects
    /// Ordered by `updated_at` descending.
    async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, DatabaseError>;
    async fn create_project(&self, input: CreateProject) -> Result<Project, DatabaseError>;

    // System prompts
    async fn find_system_prompt(
        &self,
        system_type: SystemType,
    ) -> Result<Option<SystemPrompt>, DatabaseError>;
    async fn list_system_prompts(&self) -> Result<Vec<SystemPrompt>, DatabaseError>;
    async fn upsert_system_prompt(
        &self,
        system_type: SystemType,
        prompt: String,
    ) -> Result<SystemPrompt, DatabaseError>;
    /// Inserts `prompt` only when no row exists for `system_type`, then
    /// returns whichever row is stored.
    async fn insert_system_prompt_if_absent(
        &self,
        system_type: SystemType,
        prompt: String,
    ) -> Result<SystemPrompt, DatabaseError>;
}
