//! Persistence layer.
//!
//! Postgres via `sqlx`. Rows mirror the upstream API shape and are
//! upserted by primary key; the only invariants are foreign keys and
//! identifier uniqueness. Schema lives in `migrations/` and is applied
//! at startup.

pub mod queries;
pub mod upserts;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Connect to Postgres.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to Postgres")?;

    info!(max_connections, "Connected to Postgres");
    Ok(pool)
}

/// Apply embedded migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations applied");
    Ok(())
}
