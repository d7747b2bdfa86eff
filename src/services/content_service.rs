// AI-backed content: product research, datasheets and free-form prompts
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt};
use uuid::Uuid;

use crate::database::models::{Product, UpdateProduct};
use crate::database::Repository;
use crate::error::ApiError;
use crate::generation::{
    generate_to_string, parse_structured, strip_code_fences, GenerationRequest, TextGenerator,
    TextStream,
};

use super::prompt_service::{datasheet_prompt, research_prompt, PromptService};

pub struct ContentService {
    repo: Arc<dyn Repository>,
    generator: Arc<dyn TextGenerator>,
}

impl ContentService {
    pub fn new(repo: Arc<dyn Repository>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { repo, generator }
    }

    async fn product(&self, id: Uuid) -> Result<Product, ApiError> {
        self.repo
            .find_product(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))
    }

    async fn store(&self, id: Uuid, update: UpdateProduct) -> Result<Product, ApiError> {
        self.repo
            .update_product(id, update)
            .await?
            .ok_or_else(|| ApiError::not_found("Product not found"))
    }

    /// Generates research with web search, accumulating the whole answer
    /// before a single write. Provider failures leave the stored research
    /// untouched. Non-JSON answers are kept as `{ "raw": text }`.
    pub async fn research(&self, id: Uuid, requested_prompt: Option<&str>) -> Result<Product, ApiError> {
        let product = self.product(id).await?;
        let template = PromptService::new(self.repo.clone())
            .research_template(&product, requested_prompt)
            .await?;

        tracing::info!(product_id = %id, brand = %product.brand, model = %product.model, "Starting product research");
        let request = GenerationRequest::new(research_prompt(&template, &product)).with_web_search();
        let text = generate_to_string(self.generator.as_ref(), request).await?;

        let parsed = parse_structured(&text);
        if parsed.is_raw() {
            tracing::warn!(product_id = %id, "Research output was not JSON, stored as raw text");
        }
        let research = parsed.into_value();

        let updated = self
            .store(
                id,
                UpdateProduct {
                    research_data: Some(research),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(product_id = %id, chars = text.len(), "Product research stored");
        Ok(updated)
    }

    /// Builds the datasheet HTML from stored research. Returns the cleaned
    /// HTML and the updated product.
    pub async fn datasheet(&self, id: Uuid) -> Result<(String, Product), ApiError> {
        let product = self.product(id).await?;
        let research = product
            .research_data
            .as_ref()
            .ok_or_else(|| ApiError::validation("The product has no research data"))?;

        let request = GenerationRequest::new(datasheet_prompt(&product, research));
        let html = strip_code_fences(&generate_to_string(self.generator.as_ref(), request).await?);

        let updated = self
            .store(
                id,
                UpdateProduct {
                    datasheet_content: Some(html.clone()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(product_id = %id, chars = html.len(), "Product datasheet stored");
        Ok((html, updated))
    }

    /// Starts a free-form generation and hands back the increments as they
    /// arrive. Errors after the first byte can only end the stream early.
    pub async fn prompt_stream(&self, input: &str) -> Result<TextStream, ApiError> {
        if input.trim().is_empty() {
            return Err(ApiError::validation("Input is required"));
        }
        let request = GenerationRequest::new(input).with_web_search();
        let stream = self.generator.generate(request).await?;
        Ok(stream
            .inspect_err(|e| tracing::error!("AI stream aborted: {}", e))
            .boxed())
    }
}
