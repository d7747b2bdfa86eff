// Prompt templates and their resolution for product research and datasheets
use std::sync::Arc;

use serde_json::Value;

use crate::database::models::{Product, SystemPrompt, SystemType};
use crate::database::Repository;
use crate::error::ApiError;

pub const BRAND_VARIABLE: &str = "{brand}";
pub const MODEL_VARIABLE: &str = "{model}";

/// Stored under `PRODUCTS` the first time research runs without one.
pub const DEFAULT_PRODUCTS_PROMPT: &str = "You are an expert product researcher. Your task is to \
research the following product thoroughly and provide detailed information.

Product: {brand} {model}

Please provide:
1. General product description
2. Key features
3. Technical specifications
4. Approximate price and availability
5. Advantages and disadvantages
6. Comparison with competitors
7. User opinions and reviews
8. Usage recommendations

Return the information as JSON with the following keys: description, features (array), \
specifications (object), price, advantages (array), disadvantages (array), competitors (array), \
reviews, recommendations.";

pub const WEB_SEARCH_INSTRUCTION: &str = "IMPORTANT: To answer this request you MUST use the web \
search tool to obtain current and accurate information. Do not answer from prior knowledge alone.";

pub const DATASHEET_INSTRUCTIONS: &str = "Goal: write the final product datasheet following the \
mandatory structure and using the keywords (marked in bold).

IMPORTANT: Return the datasheet as valid HTML using only these tags:
- h1 for the main title
- h2 for main section titles
- h3 for subtitles
- p for paragraphs
- strong for bold text (keywords)
- em for italics
- ul and li for bulleted lists
- ol and li for numbered lists
- Do NOT use Markdown (asterisks, hashes, etc.), ONLY HTML

General rules
Do not include links, sources, external references or mentions of documents anywhere in the datasheet.

Keyword rules
1. Short-tail keywords appear first in the title, summary, subtitles and opening paragraphs.
2. Long-tail keywords are woven naturally into the detailed description, benefits, FAQs and use cases.
3. Every short-tail keyword appears at least once; every long-tail keyword at least once in its best-fitting section.
4. Avoid keyword stuffing: never repeat the same keyword more than twice in a row.
5. Prefer natural variations (plural/singular, synonyms) to keep the text fluent.

Product model rules
1. Mention the model in the title (once, usually at the end) and in the first sentence of the detailed description.
2. Mention it in the technical specifications.
3. Do not repeat it in benefits, unique content sections, FAQs or the conclusion unless needed for clarity.

DATASHEET STRUCTURE (HTML):

Main title (h1): SEO title with product name, category, function and a relevant keyword

Section 1 - Summary: h2 catchy subtitle; p short description with strong keywords
Section 2 - Unique content 1: h2 custom title; p keyword-focused content
Section 3 - Features and Benefits: h2; p broad description (at least 1000 words overall); \
h3 Main Features with a ul list; h3 Product Benefits with p; h3 Differentiators with p
Section 4 - Unique content 2: h2 custom title; p additional content
Section 5 - How to use: h2; p usage and installation advice
Section 6 - Frequently Asked Questions: h2; ten questions, each an h3 question and a p answer
Section 7 - Unique content 3: h2 custom title; p closing content
Section 8 - Ideal Use: h2; p ideal buyer profile
Section 9 - Conclusion: h2; p summary and highlights
Section 10 - Call to Action: h2 Contact us; p invitation to get in touch";

/// Replaces every `{brand}` and `{model}`. Case-sensitive, no escaping.
pub fn render_template(template: &str, brand: &str, model: &str) -> String {
    template
        .replace(BRAND_VARIABLE, brand)
        .replace(MODEL_VARIABLE, model)
}

/// Research prompt sent to the provider: search instruction plus the rendered template.
pub fn research_prompt(template: &str, product: &Product) -> String {
    format!(
        "{}\n\n{}",
        WEB_SEARCH_INSTRUCTION,
        render_template(template, &product.brand, &product.model)
    )
}

pub fn datasheet_prompt(product: &Product, research: &Value) -> String {
    let research_json = serde_json::to_string_pretty(research).unwrap_or_else(|_| research.to_string());
    format!(
        "{instructions}

Write a complete datasheet for the following product using the available research:

Product: {brand} {model}

Research data:
{research_json}

IMPORTANT:
- Your answer must be ONLY the HTML of the datasheet
- Do NOT include backticks or any other code markers
- Start directly with the h1 title tag
- Use ONLY these HTML tags: h1, h2, h3, p, strong, em, ul, ol, li
- Every section must be clearly structured with the appropriate tags
- Important keywords must be in strong

Generate the datasheet strictly following the structure and rules above.",
        instructions = DATASHEET_INSTRUCTIONS,
        brand = product.brand,
        model = product.model,
    )
}

fn parse_system_type(raw: &str) -> Result<SystemType, ApiError> {
    SystemType::parse(raw).ok_or_else(|| ApiError::validation(format!("Invalid systemType: {}", raw)))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

pub struct PromptService {
    repo: Arc<dyn Repository>,
}

impl PromptService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// The shared `PRODUCTS` template, created with the default text the
    /// first time it is needed. Later calls return the stored row.
    pub async fn products_prompt(&self) -> Result<SystemPrompt, ApiError> {
        if let Some(existing) = self.repo.find_system_prompt(SystemType::Products).await? {
            return Ok(existing);
        }
        let created = self
            .repo
            .insert_system_prompt_if_absent(SystemType::Products, DEFAULT_PRODUCTS_PROMPT.to_string())
            .await?;
        tracing::info!("Default PRODUCTS system prompt created");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<SystemPrompt>, ApiError> {
        Ok(self.repo.list_system_prompts().await?)
    }

    /// Lookup by category key. `PRODUCTS` is materialized on first read.
    pub async fn get(&self, raw_type: &str) -> Result<SystemPrompt, ApiError> {
        match parse_system_type(raw_type)? {
            SystemType::Products => self.products_prompt().await,
            other => self
                .repo
                .find_system_prompt(other)
                .await?
                .ok_or_else(|| ApiError::not_found("System prompt not found")),
        }
    }

    pub async fn upsert(&self, raw_type: &str, prompt: &str) -> Result<SystemPrompt, ApiError> {
        if raw_type.is_empty() || prompt.trim().is_empty() {
            return Err(ApiError::validation("systemType and prompt are required"));
        }
        let system_type = parse_system_type(raw_type)?;
        let stored = self
            .repo
            .upsert_system_prompt(system_type, prompt.to_string())
            .await?;
        tracing::info!(system_type = system_type.as_str(), "System prompt saved");
        Ok(stored)
    }

    /// Template precedence: the caller's prompt, then the product's own
    /// override, then the shared `PRODUCTS` template.
    pub async fn research_template(
        &self,
        product: &Product,
        requested: Option<&str>,
    ) -> Result<String, ApiError> {
        if let Some(prompt) = non_blank(requested).or(non_blank(product.custom_prompt.as_deref())) {
            return Ok(prompt.to_string());
        }
        Ok(self.products_prompt().await?.prompt)
    }
}
