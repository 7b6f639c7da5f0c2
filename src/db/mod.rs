use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::time::Duration;
use tracing::info;

use crate::error::{AppError, AppResult};

pub async fn create_pool(database_url: &str) -> AppResult<SqlitePool> {
    info!("🔌 Connecting to database...");

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {:?}", e);
            AppError::Database(e)
        })?;

    info!("✅ Database connection pool created");
    Ok(pool)
}

/// Single-connection in-memory pool. The connection is never recycled,
/// so the schema lives as long as the pool does.
pub async fn create_memory_pool() -> AppResult<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .map_err(AppError::Database)
}

pub async fn run_migrations(pool: &SqlitePool) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {:?}", e);
        AppError::Database(e.into())
    })
}

pub async fn health_check(pool: &SqlitePool) -> AppResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(AppError::Database)?;

    Ok(())
}
