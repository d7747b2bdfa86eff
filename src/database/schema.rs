use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

/// Idempotent table definitions, applied at startup.
const SCHEMA: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id            UUID PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            name          TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            permissions   TEXT[] NOT NULL DEFAULT '{}',
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "products",
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id                UUID PRIMARY KEY,
            brand             TEXT NOT NULL,
            model             TEXT NOT NULL,
            icon              TEXT NOT NULL DEFAULT 'Package',
            finished          BOOLEAN NOT NULL DEFAULT false,
            custom_prompt     TEXT,
            research_data     JSONB,
            datasheet_content TEXT,
            created_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at        TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "projects",
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id                  UUID PRIMARY KEY,
            name                TEXT NOT NULL,
            description         TEXT NOT NULL,
            tags                TEXT[] NOT NULL DEFAULT '{}',
            available_variables TEXT[] NOT NULL DEFAULT '{}',
            response_mode       TEXT NOT NULL DEFAULT 'PROMPT',
            is_public           BOOLEAN NOT NULL DEFAULT false,
            user_id             UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
    (
        "system_prompts",
        r#"
        CREATE TABLE IF NOT EXISTS system_prompts (
            id          UUID PRIMARY KEY,
            system_type TEXT NOT NULL UNIQUE,
            prompt      TEXT NOT NULL,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    ),
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl).execute(pool).await?;
        info!("Schema ready: {}", table);
    }
    Ok(())
}
