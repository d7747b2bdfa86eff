use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CreateProduct, CreateProject, CreateUser, Product, Project, ProjectScope, SystemPrompt,
    SystemType, UpdateProduct, User, UserSummary,
};
use crate::database::repository::Repository;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    projects: HashMap<Uuid, Project>,
    system_prompts: HashMap<SystemType, SystemPrompt>,
}

impl Tables {
    fn project_count(&self, user_id: Uuid) -> i64 {
        self.projects.values().filter(|p| p.user_id == user_id).count() as i64
    }
}

/// Process-local store. Used when no database is configured and by tests.
/// Data does not survive a restart.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn create_user(&self, input: CreateUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(DatabaseError::Conflict(format!("email {} already registered", input.email)));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            name: input.name,
            password_hash: input.password_hash,
            permissions: input.permissions,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_summary(&self, id: Uuid) -> Result<Option<UserSummary>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .get(&id)
            .map(|user| UserSummary::from_user(user, tables.project_count(id))))
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut users: Vec<UserSummary> = tables
            .users
            .values()
            .map(|user| UserSummary::from_user(user, tables.project_count(user.id)))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_user_permissions(
        &self,
        id: Uuid,
        permissions: Vec<String>,
    ) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.permissions = permissions;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE CASCADE on projects.user_id
            tables.projects.retain(|_, p| p.user_id != id);
        }
        Ok(removed)
    }

    async fn list_products(&self) -> Result<Vec<Product>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(&self, input: CreateProduct) -> Result<Product, DatabaseError> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            brand: input.brand,
            model: input.model,
            icon: input.icon,
            finished: false,
            custom_prompt: None,
            research_data: None,
            datasheet_content: None,
            created_at: now,
            updated_at: now,
        };
        self.tables
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: UpdateProduct,
    ) -> Result<Option<Product>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            patch.apply_to(product, Utc::now());
            product.clone()
        }))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut projects: Vec<Project> = tables
            .projects
            .values()
            .filter(|p| scope.includes(p))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }

    async fn create_project(&self, input: CreateProject) -> Result<Project, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&input.user_id) {
            return Err(DatabaseError::NotFound(format!("user {}", input.user_id)));
        }
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            tags: input.tags,
            available_variables: input.available_variables,
            response_mode: input.response_mode,
            is_public: false,
            user_id: input.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_system_prompt(
        &self,
        system_type: SystemType,
    ) -> Result<Option<SystemPrompt>, DatabaseError> {
        Ok(self.tables.read().await.system_prompts.get(&system_type).cloned())
    }

    async fn list_system_prompts(&self) -> Result<Vec<SystemPrompt>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut prompts: Vec<SystemPrompt> = tables.system_prompts.values().cloned().collect();
        prompts.sort_by_key(|p| p.system_type.as_str());
        Ok(prompts)
    }

    async fn upsert_system_prompt(
        &self,
        system_type: SystemType,
        prompt: String,
    ) -> Result<SystemPrompt, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let entry = tables
            .system_prompts
            .entry(system_type)
            .and_modify(|existing| {
                existing.prompt = prompt.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| SystemPrompt {
                id: Uuid::new_v4(),
                system_type,
                prompt: prompt.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(entry.clone())
    }

    async fn insert_system_prompt_if_absent(
        &self,
        system_type: SystemType,
        prompt: String,
    ) -> Result<SystemPrompt, DatabaseError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let entry = tables
            .system_prompts
            .entry(system_type)
            .or_insert_with(|| SystemPrompt {
                id: Uuid::new_v4(),
                system_type,
                prompt,
                created_at: now,
                updated_at: now,
            });
        Ok(entry.clone())
    }
}
