use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a project produces a prompt for the user to copy, or runs it
/// through the AI provider and shows the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseMode {
    #[default]
    Prompt,
    AiResponse,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Prompt => "PROMPT",
            ResponseMode::AiResponse => "AI_RESPONSE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROMPT" => Some(ResponseMode::Prompt),
            "AI_RESPONSE" => Some(ResponseMode::AiResponse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub available_variables: Vec<String>,
    pub response_mode: ResponseMode,
    pub is_public: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub available_variables: Vec<String>,
    pub response_mode: ResponseMode,
    pub user_id: Uuid,
}

/// Which projects a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    OwnedBy(Uuid),
    Public,
}

impl ProjectScope {
    pub fn includes(&self, project: &Project) -> bool {
        match self {
            ProjectScope::OwnedBy(user_id) => project.user_id == *user_id,
            ProjectScope::Public => project.is_public,
        }
    }
}
