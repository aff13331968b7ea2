//! SQLite-backed cache for external routing-service auth tokens.
//!
//! The solver's own state never touches this database — it exists purely
//! so a self-hosted OSRM deployment that sits behind a token gateway
//! doesn't need to re-authenticate on every run.

use std::error::Error;
use std::str::FromStr;

use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::info;

pub async fn db_connection() -> Result<SqlitePool, Box<dyn Error>> {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        tracing::warn!("DATABASE_URL not set, using default SQLite file");
        "sqlite:vrp_database.sqlite".to_string()
    });

    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    info!("connected to SQLite database at {database_url}");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS api_tokens (
            service TEXT PRIMARY KEY,
            token TEXT NOT NULL,
            expiry INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

pub async fn cached_token(pool: &SqlitePool, service: &str) -> Result<Option<(String, i64)>, Box<dyn Error>> {
    let row: Option<(String, i64)> = sqlx::query_as("SELECT token, expiry FROM api_tokens WHERE service = ?")
        .bind(service)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn store_token(
    pool: &SqlitePool,
    service: &str,
    token: &str,
    expiry: i64,
) -> Result<(), Box<dyn Error>> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO api_tokens (service, token, expiry)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(service)
    .bind(token)
    .bind(expiry)
    .execute(pool)
    .await?;
    info!("stored token for service '{service}' with expiry {expiry}");
    Ok(())
}
