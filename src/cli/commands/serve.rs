use std::sync::Arc;

use anyhow::Context;

use crate::config::{config, AppConfig};
use crate::database::schema::ensure_schema;
use crate::database::{DatabaseManager, MemoryRepository, PgRepository, Repository};
use crate::generation::{OpenAiGenerator, TextGenerator};
use crate::routes::app;
use crate::state::AppState;

/// Postgres when `DATABASE_URL` is set, otherwise a process-local store.
pub async fn open_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn Repository>> {
    if config.database.url.is_none() {
        tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
        return Ok(Arc::new(MemoryRepository::new()));
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    ensure_schema(&pool).await.context("failed to prepare the schema")?;
    Ok(Arc::new(PgRepository::new(pool)))
}

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config().clone();
    tracing::info!("Starting Product Admin API in {:?} mode", config.environment);

    let repo = open_repository(&config).await?;
    let generator: Arc<dyn TextGenerator> = Arc::new(
        OpenAiGenerator::from_config(&config.ai).context("failed to build the AI client")?,
    );
    if config.ai.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set, generation endpoints will fail");
    }

    let port = port.unwrap_or(config.api.port);
    let state = AppState::new(repo, generator, config)
        .context("JWT_SECRET must be set outside development")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Product Admin API listening on http://{}", bind_addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
