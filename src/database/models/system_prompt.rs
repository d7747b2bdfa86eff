use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category key for shared prompt templates. One row per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemType {
    Products,
    Blog,
    Marketing,
}

impl SystemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemType::Products => "PRODUCTS",
            SystemType::Blog => "BLOG",
            SystemType::Marketing => "MARKETING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PRODUCTS" => Some(SystemType::Products),
            "BLOG" => Some(SystemType::Blog),
            "MARKETING" => Some(SystemType::Marketing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPrompt {
    pub id: Uuid,
    pub system_type: SystemType,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
