// bazaar/server/src/db/mod.rs

//! SQLite persistence. Query functions take a `&mut SqliteConnection` so callers can run
//! them on a pooled connection or inside a transaction.

pub mod orders;
pub mod products;
pub mod seed;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens the pool. WAL plus a busy timeout lets concurrent writers queue on the database lock
/// instead of failing with `SQLITE_BUSY`.
pub async fn new_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
  let options = SqliteConnectOptions::from_str(database_url)?
    .create_if_missing(true)
    .journal_mode(SqliteJournalMode::Wal)
    .busy_timeout(BUSY_TIMEOUT)
    .foreign_keys(true);
  if let Some(dir) = options.get_filename().parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir)
      .map_err(|e| AppError::Config(format!("Cannot create database directory {}: {}", dir.display(), e)))?;
  }
  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections.max(1))
    .connect_with(options)
    .await?;
  info!("Connected to {}", database_url);
  Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
  sqlx::migrate!("./migrations").run(pool).await?;
  info!("Database migrations applied.");
  Ok(())
}

/// Pool with migrations applied, ready for the server.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool> {
  let pool = new_pool(&config.database_url, config.db_max_connections).await?;
  migrate(&pool).await?;
  Ok(pool)
}
