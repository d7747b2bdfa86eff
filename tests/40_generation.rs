mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use product_admin_api::database::models::{SystemType, UpdateProduct};
use product_admin_api::database::Repository;
use product_admin_api::permissions::{marketing, products};
use product_admin_api::services::prompt_service::DEFAULT_PRODUCTS_PROMPT;

#[tokio::test]
async fn research_creates_default_template_once() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server.user_with("research@example.com", &[products::RESEARCH]).await?;
    server.generator.reply(&[r#"{"description": "#, r#""A fine widget"}"#]);

    let path = format!("/api/products/{}/research", product.id);
    for _ in 0..2 {
        let res = server.post(&path, &token).send().await?;
        assert_eq!(res.status(), StatusCode::OK);
        let body = res.json::<Value>().await?;
        assert_eq!(body["researchData"], json!({ "description": "A fine widget" }));
    }

    let prompts = server.repo.list_system_prompts().await?;
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].system_type, SystemType::Products);
    assert_eq!(prompts[0].prompt, DEFAULT_PRODUCTS_PROMPT);

    let requests = server.generator.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.web_search));
    assert!(requests[0].prompt.contains("Product: Acme X1"));
    assert!(!requests[0].prompt.contains("{brand}"));

    Ok(())
}

#[tokio::test]
async fn research_prompt_precedence() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server.user_with("research@example.com", &[products::RESEARCH]).await?;
    server.generator.reply(&["{}"]);
    server
        .repo
        .update_product(
            product.id,
            UpdateProduct {
                custom_prompt: Some(Some("Own template for {model}".into())),
                ..Default::default()
            },
        )
        .await?;
    let path = format!("/api/products/{}/research", product.id);

    let res = server
        .post(&path, &token)
        .json(&json!({ "prompt": "Requested for {brand}" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.post(&path, &token).json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let requests = server.generator.requests();
    assert!(requests[0].prompt.ends_with("Requested for Acme"));
    assert!(requests[1].prompt.ends_with("Own template for X1"));
    assert!(server.repo.list_system_prompts().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn non_json_research_is_wrapped_as_raw() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server.user_with("research@example.com", &[products::RESEARCH]).await?;
    server.generator.reply(&["Sorry, ", "plain prose only."]);

    let res = server
        .post(&format!("/api/products/{}/research", product.id), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["researchData"], json!({ "raw": "Sorry, plain prose only." }));

    Ok(())
}

#[tokio::test]
async fn failed_research_keeps_previous_data() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server.user_with("research@example.com", &[products::RESEARCH]).await?;
    let path = format!("/api/products/{}/research", product.id);

    server.generator.reply(&[r#"{"price": "99"}"#]);
    let res = server.post(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    server.generator.fail_after(&[r#"{"price": "#]);
    let res = server.post(&path, &token).send().await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<Value>().await?;
    assert!(body["error"].is_string());

    let stored = server.repo.find_product(product.id).await?;
    assert_eq!(
        stored.and_then(|p| p.research_data),
        Some(json!({ "price": "99" }))
    );

    Ok(())
}

#[tokio::test]
async fn research_needs_research_permission() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server
        .user_with("editor@example.com", &[products::VIEW, products::EDIT])
        .await?;

    let res = server
        .post(&format!("/api/products/{}/research", product.id), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(server.generator.requests().is_empty());

    Ok(())
}

#[tokio::test]
async fn datasheet_requires_research_first() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server.user_with("sheet@example.com", &[products::DATASHEET]).await?;

    let res = server
        .post(&format!("/api/products/{}/datasheet", product.id), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?["error"],
        "The product has no research data"
    );
    assert!(server.generator.requests().is_empty());

    Ok(())
}

#[tokio::test]
async fn datasheet_strips_code_fences() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    server
        .repo
        .update_product(
            product.id,
            UpdateProduct {
                research_data: Some(json!({ "description": "A fine widget" })),
                ..Default::default()
            },
        )
        .await?;
    let (_, token) = server.user_with("sheet@example.com", &[products::DATASHEET]).await?;
    server.generator.reply(&["```html\n<h1>Acme X1</h1>", "<p>Widget</p>\n```"]);

    let res = server
        .post(&format!("/api/products/{}/datasheet", product.id), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["datasheet"], "<h1>Acme X1</h1><p>Widget</p>");
    assert_eq!(body["product"]["datasheetContent"], "<h1>Acme X1</h1><p>Widget</p>");

    let requests = server.generator.requests();
    assert!(!requests[0].web_search);
    assert!(requests[0].prompt.contains("A fine widget"));

    Ok(())
}

#[tokio::test]
async fn prompt_streams_plain_text() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server
        .user_with("marketer@example.com", &[marketing::CREATE_CAMPAIGNS])
        .await?;
    server.generator.reply(&["Built ", "to ", "last."]);

    let res = server
        .post("/api/ai/prompt", &token)
        .json(&json!({ "input": "Tagline for Acme X1" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"), "got {}", content_type);
    assert_eq!(res.text().await?, "Built to last.");

    let requests = server.generator.requests();
    assert_eq!(requests[0].prompt, "Tagline for Acme X1");
    assert!(requests[0].web_search);

    Ok(())
}

#[tokio::test]
async fn prompt_rejects_blank_input_and_outsiders() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, writer) = server.user_with("writer@example.com", &[products::RESEARCH]).await?;
    let (_, viewer) = server.user_with("viewer@example.com", &[products::VIEW]).await?;

    let res = server
        .post("/api/ai/prompt", &writer)
        .json(&json!({ "input": "   " }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "Input is required");

    let res = server
        .post("/api/ai/prompt", &viewer)
        .json(&json!({ "input": "Hello" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(server.generator.requests().is_empty());

    Ok(())
}

#[tokio::test]
async fn json_research_with_raw_field_is_stored_unchanged() -> Result<()> {
    let server = common::spawn_server().await?;
    let product = server.seed_product("Acme", "X1").await?;
    let (_, token) = server.user_with("research@example.com", &[products::RESEARCH]).await?;
    server.generator.reply(&[r#"{"raw": "spec sheet", "price": "99"}"#]);

    let res = server
        .post(&format!("/api/products/{}/research", product.id), &token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["researchData"], json!({ "raw": "spec sheet", "price": "99" }));

    Ok(())
}
