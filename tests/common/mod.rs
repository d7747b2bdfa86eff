#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use serde_json::{json, Value};

use product_admin_api::auth::hash_password;
use product_admin_api::config::AppConfig;
use product_admin_api::database::models::{CreateProduct, CreateUser, Product, User};
use product_admin_api::database::{MemoryRepository, Repository};
use product_admin_api::generation::{
    GenerationError, GenerationRequest, TextGenerator, TextStream,
};
use product_admin_api::{app, AppState};

pub const PASSWORD: &str = "correct-horse";

/// In-process server on an ephemeral port, backed by its own memory store.
/// Each test gets a fresh one so seeded data never leaks between tests.
pub struct TestServer {
    pub base_url: String,
    pub repo: Arc<MemoryRepository>,
    pub generator: Arc<ScriptedGenerator>,
    pub client: reqwest::Client,
}

pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(AppConfig::development()).await
}

pub async fn spawn_server_with(mut config: AppConfig) -> Result<TestServer> {
    config.api.enable_request_logging = false;

    let repo = Arc::new(MemoryRepository::new());
    let generator = Arc::new(ScriptedGenerator::default());
    let state = AppState::new(repo.clone(), generator.clone(), config)
        .context("failed to build app state")?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://{}", listener.local_addr()?);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    let server = TestServer {
        base_url,
        repo,
        generator,
        client: reqwest::Client::new(),
    };
    server.wait_until_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            if Instant::now() > deadline {
                bail!("server did not become ready within {:?}", timeout);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Inserts a user directly into the store with [`PASSWORD`].
    pub async fn seed_user(&self, email: &str, permissions: &[&str]) -> Result<User> {
        let user = self
            .repo
            .create_user(CreateUser {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or(email).to_string(),
                password_hash: hash_password(PASSWORD)?,
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
            })
            .await?;
        Ok(user)
    }

    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            bail!("login for {} failed with {}", email, res.status());
        }
        let body = res.json::<Value>().await?;
        body["token"]
            .as_str()
            .map(String::from)
            .context("login response has no token")
    }

    /// Seeds a user and logs in as them.
    pub async fn user_with(&self, email: &str, permissions: &[&str]) -> Result<(User, String)> {
        let user = self.seed_user(email, permissions).await?;
        let token = self.login(email).await?;
        Ok((user, token))
    }

    pub async fn seed_product(&self, brand: &str, model: &str) -> Result<Product> {
        let product = self
            .repo
            .create_product(CreateProduct {
                brand: brand.to_string(),
                model: model.to_string(),
                icon: "Package".to_string(),
            })
            .await?;
        Ok(product)
    }

    pub fn get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }
}

#[derive(Default)]
struct Script {
    chunks: Vec<String>,
    fail: bool,
}

/// Stands in for the AI provider. Replies with the scripted chunks and
/// records every request it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<Script>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn reply(&self, chunks: &[&str]) {
        if let Ok(mut script) = self.script.lock() {
            script.chunks = chunks.iter().map(|c| c.to_string()).collect();
            script.fail = false;
        }
    }

    /// Sends `chunks` and then reports a provider error.
    pub fn fail_after(&self, chunks: &[&str]) {
        self.reply(chunks);
        if let Ok(mut script) = self.script.lock() {
            script.fail = true;
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let (chunks, fail) = match self.script.lock() {
            Ok(script) => (script.chunks.clone(), script.fail),
            Err(_) => (Vec::new(), true),
        };

        let mut items: Vec<Result<String, GenerationError>> = chunks.into_iter().map(Ok).collect();
        if fail {
            items.push(Err(GenerationError::Provider("quota exceeded".into())));
        }
        Ok(futures::stream::iter(items).boxed())
    }
}
