pub mod advice;
pub mod periodization;

use crate::config::EngineConfig;
use crate::db::{self, AppState, DbPool};
use crate::error::EngineError;
use crate::state::PeriodizationState;
use crate::storage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Connect, migrate the schema, load the saved state and fold any legacy keys
pub async fn bootstrap(config: &EngineConfig) -> Result<Arc<AppState>, String> {
  let pool = db::initialize_db(config).await.map_err(|e| e.to_string())?;

  let mut engine = storage::load_state(&pool, &config.catalog, config.meso_len)
    .await
    .map_err(|e| format!("Failed to load training state: {}", e))?;

  storage::migrate_legacy(&pool, &mut engine)
    .await
    .map_err(|e| format!("Failed to migrate legacy data: {}", e))?;

  info!(
    week_no = engine.volume().week_no(),
    block_no = engine.volume().block_no(),
    phase = %engine.current_phase(),
    "Engine ready"
  );

  Ok(Arc::new(AppState {
    db: pool,
    engine: Mutex::new(engine),
  }))
}

/// Save the snapshot if the last mutation changed anything. The flag is only
/// cleared once the write succeeds.
async fn write_through(db: &DbPool, engine: &mut PeriodizationState) -> Result<(), String> {
  if engine.is_dirty() {
    storage::save_state(db, engine)
      .await
      .map_err(|e| format!("Failed to save training state: {}", e))?;
    engine.take_dirty();
  }
  Ok(())
}

/// Run a mutation under the engine lock, then write through
pub(crate) async fn mutate<T>(
  state: &AppState,
  f: impl FnOnce(&mut PeriodizationState) -> Result<T, EngineError>,
) -> Result<T, String> {
  let mut engine = state.engine.lock().await;
  let result = f(&mut engine).map_err(|e| e.to_string())?;
  write_through(&state.db, &mut engine).await?;
  Ok(result)
}

/// Run a read-only query under the engine lock
pub(crate) async fn query<T>(
  state: &AppState,
  f: impl FnOnce(&PeriodizationState) -> Result<T, EngineError>,
) -> Result<T, String> {
  let engine = state.engine.lock().await;
  f(&engine).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{memory_config, seed_legacy_keys, setup_test_state};

  #[tokio::test]
  async fn test_bootstrap_fresh_install() {
    let state = bootstrap(&memory_config()).await.expect("bootstrap");
    let engine = state.engine.lock().await;
    assert_eq!(engine.volume().week_no(), 1);
    assert!(!engine.is_dirty());
  }

  #[tokio::test]
  async fn test_mutation_writes_through() {
    let state = setup_test_state().await;

    mutate(&state, |engine| engine.update_weekly_sets("Chest", 11))
      .await
      .unwrap();

    let saved = storage::load_state(&state.db, &Default::default(), 4).await.unwrap();
    assert_eq!(saved.weekly_sets("Chest").unwrap(), 11);
    assert!(!state.engine.lock().await.is_dirty());
  }

  #[tokio::test]
  async fn test_failed_mutation_writes_nothing() {
    let state = setup_test_state().await;

    let err = mutate(&state, |engine| engine.update_weekly_sets("Wings", 3))
      .await
      .unwrap_err();
    assert!(err.contains("Wings"));
    assert_eq!(storage::load_value(&state.db, storage::STORAGE_KEY).await.unwrap(), None);
  }

  #[tokio::test]
  async fn test_legacy_keys_folded_on_startup() {
    let state = setup_test_state().await;
    seed_legacy_keys(&state.db).await;

    let mut engine = state.engine.lock().await;
    let migrated = storage::migrate_legacy(&state.db, &mut engine).await.unwrap();
    assert_eq!(migrated, 3);
    assert_eq!(engine.weekly_sets("Chest").unwrap(), 12);
  }
}
