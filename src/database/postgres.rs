use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CreateProduct, CreateProject, CreateUser, Product, Project, ProjectScope, ResponseMode,
    SystemPrompt, SystemType, UpdateProduct, User, UserSummary,
};
use crate::database::repository::Repository;

const USER_COLUMNS: &str = "id, email, name, password_hash, permissions, created_at, updated_at";

const USER_SUMMARY_SELECT: &str = r#"
    SELECT u.id, u.email, u.name, u.permissions, u.created_at, u.updated_at,
           (SELECT COUNT(*) FROM projects p WHERE p.user_id = u.id) AS project_count
    FROM users u
"#;

const PRODUCT_COLUMNS: &str = "id, brand, model, icon, finished, custom_prompt, research_data, \
                               datasheet_content, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, name, description, tags, available_variables, response_mode, \
                               is_public, user_id, created_at, updated_at";

const SYSTEM_PROMPT_COLUMNS: &str = "id, system_type, prompt, created_at, updated_at";

/// Postgres-backed store
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    description: String,
    tags: Vec<String>,
    available_variables: Vec<String>,
    response_mode: String,
    is_public: bool,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = DatabaseError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let response_mode = ResponseMode::parse(&row.response_mode).ok_or_else(|| {
            DatabaseError::QueryError(format!("unknown response_mode '{}'", row.response_mode))
        })?;
        Ok(Project {
            id: row.id,
            name: row.name,
            description: row.description,
            tags: row.tags,
            available_variables: row.available_variables,
            response_mode,
            is_public: row.is_public,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SystemPromptRow {
    id: Uuid,
    system_type: String,
    prompt: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SystemPromptRow> for SystemPrompt {
    type Error = DatabaseError;

    fn try_from(row: SystemPromptRow) -> Result<Self, Self::Error> {
        let system_type = SystemType::parse(&row.system_type).ok_or_else(|| {
            DatabaseError::QueryError(format!("unknown system_type '{}'", row.system_type))
        })?;
        Ok(SystemPrompt {
            id: row.id,
            system_type,
            prompt: row.prompt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, input: CreateUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, password_hash, permissions) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.password_hash)
            .bind(&input.permissions)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_summary(&self, id: Uuid) -> Result<Option<UserSummary>, DatabaseError> {
        let sql = format!("{USER_SUMMARY_SELECT} WHERE u.id = $1");
        let summary = sqlx::query_as::<_, UserSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(summary)
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, DatabaseError> {
        let sql = format!("{USER_SUMMARY_SELECT} ORDER BY u.created_at DESC");
        let users = sqlx::query_as::<_, UserSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn set_user_permissions(
        &self,
        id: Uuid,
        permissions: Vec<String>,
    ) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "UPDATE users SET permissions = $2, updated_at = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&permissions)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC");
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn create_product(&self, input: CreateProduct) -> Result<Product, DatabaseError> {
        let sql = format!(
            "INSERT INTO products (id, brand, model, icon) VALUES ($1, $2, $3, $4) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.brand)
            .bind(&input.model)
            .bind(&input.icon)
            .fetch_one(&self.pool)
            .await?;
        Ok(product)
    }

    async fn update_product(
        &self,
        id: Uuid,
        patch: UpdateProduct,
    ) -> Result<Option<Product>, DatabaseError> {
        // custom_prompt needs an explicit flag: NULL is a legal new value
        let sql = format!(
            r#"
            UPDATE products SET
                brand             = COALESCE($2, brand),
                model             = COALESCE($3, model),
                icon              = COALESCE($4, icon),
                finished          = COALESCE($5, finished),
                custom_prompt     = CASE WHEN $6 THEN $7 ELSE custom_prompt END,
                research_data     = COALESCE($8, research_data),
                datasheet_content = COALESCE($9, datasheet_content),
                updated_at        = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let set_custom_prompt = patch.custom_prompt.is_some();
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(patch.brand)
            .bind(patch.model)
            .bind(patch.icon)
            .bind(patch.finished)
            .bind(set_custom_prompt)
            .bind(patch.custom_prompt.flatten())
            .bind(patch.research_data)
            .bind(patch.datasheet_content)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self, scope: ProjectScope) -> Result<Vec<Project>, DatabaseError> {
        let rows = match scope {
            ProjectScope::OwnedBy(user_id) => {
                let sql = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = $1 ORDER BY updated_at DESC"
                );
                sqlx::query_as::<_, ProjectRow>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            ProjectScope::Public => {
                let sql = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE is_public ORDER BY updated_at DESC"
                );
                sqlx::query_as::<_, ProjectRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(Project::try_from).collect()
    }

    async fn create_project(&self, input: CreateProject) -> Result<Project, DatabaseError> {
        let sql = format!(
            "INSERT INTO projects (id, name, description, tags, available_variables, response_mode, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {PROJECT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.tags)
            .bind(&input.available_variables)
            .bind(input.response_mode.as_str())
            .bind(input.user_id)
            .fetch_one(&self.pool)
            .await?;
        Project::try_from(row)
    }

    async fn find_system_prompt(
        &self,
        system_type: SystemType,
    ) -> Result<Option<SystemPrompt>, DatabaseError> {
        let sql = format!("SELECT {SYSTEM_PROMPT_COLUMNS} FROM system_prompts WHERE system_type = $1");
        let row = sqlx::query_as::<_, SystemPromptRow>(&sql)
            .bind(system_type.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(SystemPrompt::try_from).transpose()
    }

    async fn list_system_prompts(&self) -> Result<Vec<SystemPrompt>, DatabaseError> {
        let sql = format!("SELECT {SYSTEM_PROMPT_COLUMNS} FROM system_prompts ORDER BY system_type");
        let rows = sqlx::query_as::<_, SystemPromptRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(SystemPrompt::try_from).collect()
    }

    async fn upsert_system_prompt(
        &self,
        system_type: SystemType,
        prompt: String,
    ) -> Result<SystemPrompt, DatabaseError> {
        let sql = format!(
            "INSERT INTO system_prompts (id, system_type, prompt) VALUES ($1, $2, $3) \
             ON CONFLICT (system_type) DO UPDATE SET prompt = EXCLUDED.prompt, updated_at = now() \
             RETURNING {SYSTEM_PROMPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, SystemPromptRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(system_type.as_str())
            .bind(&prompt)
            .fetch_one(&self.pool)
            .await?;
        SystemPrompt::try_from(row)
    }

    async fn insert_system_prompt_if_absent(
        &self,
        system_type: SystemType,
        prompt: String,
    ) -> Result<SystemPrompt, DatabaseError> {
        sqlx::query(
            "INSERT INTO system_prompts (id, system_type, prompt) VALUES ($1, $2, $3) \
             ON CONFLICT (system_type) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(system_type.as_str())
        .bind(&prompt)
        .execute(&self.pool)
        .await?;

        self.find_system_prompt(system_type)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("system prompt {}", system_type.as_str())))
    }
}
