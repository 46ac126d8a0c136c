use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::state::PeriodizationState;

pub type DbPool = SqlitePool;

/// Shared handle: the pool plus the one engine instance. The mutex makes
/// every command a single writer over the aggregate.
pub struct AppState {
  pub db: DbPool,
  pub engine: Mutex<PeriodizationState>,
}

/// File path behind a `sqlite://` URL, if it names a file
fn db_file_path(database_url: &str) -> Option<PathBuf> {
  let path = database_url.strip_prefix("sqlite://")?;
  let path = path.split('?').next().unwrap_or(path);
  if path.is_empty() || path.contains(":memory:") {
    return None;
  }
  Some(PathBuf::from(path))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(config: &EngineConfig) -> Result<DbPool, EngineError> {
  if let Some(parent) = db_file_path(&config.database_url).and_then(|p| p.parent().map(PathBuf::from)) {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(&parent)
        .map_err(|e| EngineError::Config(format!("Failed to create {}: {}", parent.display(), e)))?;
    }
  }

  info!(url = %config.database_url, "Initializing database");

  // An in-memory database only exists on the connection that created it
  let max_connections = if config.database_url.contains(":memory:") { 1 } else { 5 };

  let pool = SqlitePoolOptions::new()
    .max_connections(max_connections)
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_db_file_path() {
    assert_eq!(
      db_file_path("sqlite://./data/periodization.db?mode=rwc"),
      Some(PathBuf::from("./data/periodization.db"))
    );
    assert_eq!(db_file_path("sqlite::memory:"), None);
    assert_eq!(db_file_path("postgres://localhost"), None);
  }

  #[tokio::test]
  async fn test_initialize_in_memory_db() {
    let config = EngineConfig {
      database_url: "sqlite::memory:".to_string(),
      ..Default::default()
    };
    let pool = initialize_db(&config).await.unwrap();

    let tables: Vec<(String,)> = sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'kv_store'")
      .fetch_all(&pool)
      .await
      .unwrap();
    assert_eq!(tables.len(), 1);

    pool.close().await;
  }
}
