//! Shared SQLite connection pool.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::config::StoreConfig;

/// Open the process-wide pool, creating the database file (and its parent
/// directory) when missing. Foreign keys are enforced on every connection.
pub async fn connect_database(config: &StoreConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("invalid DATABASE_URL {:?}", config.database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create database directory at {parent:?}"))?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open SQLite pool at {}", config.database_url))?;

    tracing::info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "connected to inventory database"
    );
    Ok(pool)
}
