use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PRODUCT_ICON: &str = "Package";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub icon: String,
    pub finished: bool,
    pub custom_prompt: Option<String>,
    pub research_data: Option<Value>,
    pub datasheet_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub brand: String,
    pub model: String,
    pub icon: String,
}

/// Partial update. `None` leaves the stored column untouched.
///
/// `custom_prompt` is doubly optional so a caller can clear the override
/// (`Some(None)`) as well as leave it alone (`None`).
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub icon: Option<String>,
    pub finished: Option<bool>,
    pub custom_prompt: Option<Option<String>>,
    pub research_data: Option<Value>,
    pub datasheet_content: Option<String>,
}

impl UpdateProduct {
    /// Applies the present fields to `product` and bumps `updated_at`.
    pub fn apply_to(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(brand) = self.brand {
            product.brand = brand;
        }
        if let Some(model) = self.model {
            product.model = model;
        }
        if let Some(icon) = self.icon {
            product.icon = icon;
        }
        if let Some(finished) = self.finished {
            product.finished = finished;
        }
        if let Some(custom_prompt) = self.custom_prompt {
            product.custom_prompt = custom_prompt;
        }
        if let Some(research_data) = self.research_data {
            product.research_data = Some(research_data);
        }
        if let Some(datasheet_content) = self.datasheet_content {
            product.datasheet_content = Some(datasheet_content);
        }
        product.updated_at = now;
    }
}
