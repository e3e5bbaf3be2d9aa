use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{config::DatabaseConfig, error::Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects the pool and brings the catalog, order and notification tables
/// up to the latest migration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.url)
        .await?;

    let migrator = sqlx::migrate!();
    migrator.run(&pool).await?;

    tracing::info!(
        max_connections = config.max_connections,
        migrations = migrator.iter().count(),
        "Ledger database ready"
    );

    Ok(pool)
}

/// Round-trip used by `GET /health/ready`.
pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
