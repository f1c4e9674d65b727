use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::TripwiseError;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Migrations embedded at compile time from `tripwise-core/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.url)
        .await
}

/// Apply pending migrations. Run by `tripwise-server migrate`, never on serve.
pub async fn run_migrations(pool: &PgPool) -> Result<(), TripwiseError> {
    MIGRATOR.run(pool).await?;
    tracing::info!("migrations applied successfully");
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

/// Latest applied migration version, or `None` on a fresh database.
pub async fn schema_version(pool: &PgPool) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT version FROM _sqlx_migrations WHERE success ORDER BY version DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}
