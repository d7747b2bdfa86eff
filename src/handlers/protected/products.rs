// handlers/protected/products.rs - /api/products CRUD and per-product edits
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Session;
use crate::database::models::Product;
use crate::middleware::{ApiResponse, ApiResult, Requirement};
use crate::permissions::products;
use crate::services::{CreateProductRequest, ProductService, UpdateProductRequest};
use crate::state::AppState;

/// Any product-facing role may read products.
pub const READ_PRODUCTS: Requirement =
    Requirement::AnyOf(&[products::VIEW, products::RESEARCH, products::DATASHEET]);

#[derive(Debug, Default, Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DatasheetContentRequest {
    #[serde(default)]
    pub content: String,
}

/// GET /api/products - All products, newest first
pub async fn products_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Vec<Product>> {
    session.require(READ_PRODUCTS, "You do not have permission to view products")?;
    Ok(ApiResponse::success(ProductService::new(state.repo).list().await?))
}

/// POST /api/products
///
/// Expected Input:
/// ```json
/// { "brand": "Acme", "model": "X1", "icon": "Cpu" }
/// ```
/// `icon` is optional and defaults to `Package`.
pub async fn products_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<Product> {
    session.require(
        Requirement::AllOf(&[products::CREATE]),
        "You do not have permission to create products",
    )?;
    let Json(body) = payload?;
    Ok(ApiResponse::created(ProductService::new(state.repo).create(body).await?))
}

/// GET /api/products/:id
pub async fn product_get(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Product> {
    session.require(READ_PRODUCTS, "You do not have permission to view products")?;
    let Path(id) = id?;
    Ok(ApiResponse::success(ProductService::new(state.repo).get(id).await?))
}

/// PATCH /api/products/:id - Partial update of brand, model, icon, finished
pub async fn product_patch(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Product> {
    session.require(
        Requirement::AnyOf(&[products::EDIT, products::FINISH]),
        "You do not have permission to edit products",
    )?;
    let Json(body) = payload?;
    body.authorize(&session)?;
    let Path(id) = id?;
    Ok(ApiResponse::success(ProductService::new(state.repo).update(id, body).await?))
}

/// DELETE /api/products/:id
pub async fn product_delete(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    session.require(
        Requirement::AllOf(&[products::DELETE]),
        "You do not have permission to delete products",
    )?;
    let Path(id) = id?;
    ProductService::new(state.repo).delete(id).await?;
    Ok(ApiResponse::success(json!({ "success": true })))
}

/// PATCH /api/products/:id/prompt - Set or clear the product's research prompt
///
/// Expected Input:
/// ```json
/// { "prompt": "Research {brand} {model} for the EU market" }
/// ```
/// A blank or null prompt clears the override.
pub async fn product_prompt_patch(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> ApiResult<Product> {
    session.require(
        Requirement::AnyOf(&[products::EDIT, products::RESEARCH]),
        "You do not have permission to edit the research prompt",
    )?;
    let Path(id) = id?;
    let Json(body) = payload?;
    let product = ProductService::new(state.repo)
        .set_custom_prompt(id, body.prompt)
        .await?;
    Ok(ApiResponse::success(product))
}

/// PATCH /api/products/:id/datasheet - Store hand-edited datasheet HTML
pub async fn product_datasheet_patch(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<DatasheetContentRequest>, JsonRejection>,
) -> ApiResult<Value> {
    session.require(
        Requirement::AllOf(&[products::DATASHEET]),
        "You do not have permission to edit datasheets",
    )?;
    let Path(id) = id?;
    let Json(body) = payload?;
    let product = ProductService::new(state.repo)
        .set_datasheet(id, body.content)
        .await?;
    Ok(ApiResponse::success(json!({ "success": true, "product": product })))
}
