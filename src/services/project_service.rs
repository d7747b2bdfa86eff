use std::sync::Arc;

use serde::Deserialize;

use crate::auth::Session;
use crate::database::models::{CreateProject, Project, ProjectScope, ResponseMode};
use crate::database::Repository;
use crate::error::ApiError;
use crate::permissions::system;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub available_variables: Vec<String>,
    pub response_mode: Option<String>,
}

pub struct ProjectService {
    repo: Arc<dyn Repository>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Settings managers see the projects they own; everyone else sees the
    /// public ones.
    pub fn scope_for(session: &Session) -> ProjectScope {
        if session.permissions.has(system::MANAGE_SETTINGS) {
            ProjectScope::OwnedBy(session.user_id)
        } else {
            ProjectScope::Public
        }
    }

    pub async fn list(&self, session: &Session) -> Result<Vec<Project>, ApiError> {
        Ok(self.repo.list_projects(Self::scope_for(session)).await?)
    }

    pub async fn create(&self, session: &Session, request: CreateProjectRequest) -> Result<Project, ApiError> {
        if request.name.trim().is_empty() || request.description.trim().is_empty() {
            return Err(ApiError::validation("Name and description are required"));
        }
        let response_mode = match request.response_mode.as_deref() {
            None => ResponseMode::default(),
            Some(raw) => ResponseMode::parse(raw).ok_or_else(|| {
                ApiError::validation(format!("Invalid responseMode: {}", raw))
            })?,
        };

        let project = self
            .repo
            .create_project(CreateProject {
                name: request.name,
                description: request.description,
                tags: request.tags,
                available_variables: request.available_variables,
                response_mode,
                user_id: session.user_id,
            })
            .await?;
        tracing::info!(project_id = %project.id, user_id = %session.user_id, "Project created");
        Ok(project)
    }
}
