use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::database::models::product::DEFAULT_PRODUCT_ICON;
use crate::database::models::{CreateProduct, Product, UpdateProduct};
use crate::database::Repository;
use crate::error::ApiError;
use crate::middleware::Requirement;
use crate::permissions::products;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub icon: Option<String>,
    pub finished: Option<bool>,
}

impl UpdateProductRequest {
    fn touches_content(&self) -> bool {
        self.brand.is_some() || self.model.is_some() || self.icon.is_some()
    }

    /// `finished` may be set by holders of `products:finish` or
    /// `products:edit`; every other field (and an empty patch) needs
    /// `products:edit`.
    pub fn authorize(&self, session: &Session) -> Result<(), ApiError> {
        if self.finished.is_some() {
            session.require(
                Requirement::AnyOf(&[products::FINISH, products::EDIT]),
                "You do not have permission to finish products",
            )?;
        }
        if self.touches_content() || self.finished.is_none() {
            session.require(
                Requirement::AllOf(&[products::EDIT]),
                "You do not have permission to edit products",
            )?;
        }
        Ok(())
    }

    fn into_update(self) -> UpdateProduct {
        // Blank strings leave the stored value alone
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        UpdateProduct {
            brand: non_empty(self.brand),
            model: non_empty(self.model),
            icon: non_empty(self.icon),
            finished: self.finished,
            ..Default::default()
        }
    }
}

pub struct ProductService {
    repo: Arc<dyn Repository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Product>, ApiError> {
        Ok(self.repo.list_products().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, ApiError> {
        self.repo
            .find_product(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))
    }

    pub async fn create(&self, request: CreateProductRequest) -> Result<Product, ApiError> {
        if request.brand.trim().is_empty() || request.model.trim().is_empty() {
            return Err(ApiError::validation("Brand and model are required"));
        }
        let icon = request
            .icon
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| DEFAULT_PRODUCT_ICON.to_string());

        let product = self
            .repo
            .create_product(CreateProduct {
                brand: request.brand,
                model: request.model,
                icon,
            })
            .await?;
        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Caller must have passed [`UpdateProductRequest::authorize`].
    pub async fn update(&self, id: Uuid, request: UpdateProductRequest) -> Result<Product, ApiError> {
        self.patch(id, request.into_update()).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.repo.delete_product(id).await? {
            return Err(ApiError::not_found("Product not found"));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Sets the per-product research prompt; blank or missing clears it.
    pub async fn set_custom_prompt(&self, id: Uuid, prompt: Option<String>) -> Result<Product, ApiError> {
        let prompt = prompt.filter(|p| !p.trim().is_empty());
        self.patch(
            id,
            UpdateProduct {
                custom_prompt: Some(prompt),
                ..Default::default()
            },
        )
        .await
    }

    /// Stores hand-edited datasheet HTML.
    pub async fn set_datasheet(&self, id: Uuid, content: String) -> Result<Product, ApiError> {
        self.patch(
            id,
            UpdateProduct {
                datasheet_content: Some(content),
                ..Default::default()
            },
        )
        .await
    }

    async fn patch(&self, id: Uuid, update: UpdateProduct) -> Result<Product, ApiError> {
        let product = self
            .repo
            .update_product(id, update)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))?;
        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }
}
