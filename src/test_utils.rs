//! Fixtures shared by the engine and command tests: an in-memory store
//! opened through the normal startup path, ready-made engine states and
//! weekly feedback builders.

use crate::config::{EngineConfig, MuscleCatalog, DEFAULT_MESO_LEN};
use crate::db::{self, AppState, DbPool};
use crate::models::MuscleGroupId;
use crate::state::{MuscleFeedback, PeriodizationState};
use crate::stimulus::StimulusFeedback;
use crate::storage;
use std::sync::Arc;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Fresh `sqlite::memory:` pool with the kv schema applied.
/// `initialize_db` keeps memory pools at one connection so every query sees
/// the same database.
pub async fn setup_test_db() -> DbPool {
  db::initialize_db(&memory_config())
    .await
    .expect("in-memory store")
}

pub async fn teardown_test_db(pool: DbPool) {
  pool.close().await;
}

/// Config pointing at an in-memory database with the built-in catalog
pub fn memory_config() -> EngineConfig {
  EngineConfig {
    database_url: "sqlite::memory:".to_string(),
    meso_len: DEFAULT_MESO_LEN,
    catalog: MuscleCatalog::default(),
  }
}

/// Shared handle over a fresh in-memory database and a default engine
pub async fn setup_test_state() -> Arc<AppState> {
  Arc::new(AppState {
    db: setup_test_db().await,
    engine: Mutex::new(default_state()),
  })
}

/// Write the three kinds of pre-snapshot keys:
/// week-1-Chest = 12, Back-MEV = 12, Back-MRV = 24
pub async fn seed_legacy_keys(pool: &DbPool) {
  for (key, value) in [("week-1-Chest", "12"), ("Back-MEV", "12"), ("Back-MRV", "24")] {
    storage::store_value(pool, key, value)
      .await
      .expect("Failed to seed legacy key");
  }
}

// ---------------------------------------------------------------------------
// Engine states
// ---------------------------------------------------------------------------

/// Week 1 of block 1, 4-week mesocycle, built-in catalog
pub fn default_state() -> PeriodizationState {
  PeriodizationState::new(&MuscleCatalog::default(), DEFAULT_MESO_LEN).expect("Default catalog is valid")
}

/// Default state with every muscle's current sets overridden
pub fn state_with_sets(sets: &[(&str, i64)]) -> PeriodizationState {
  let mut state = default_state();
  for (muscle, count) in sets {
    state
      .update_weekly_sets(muscle, *count)
      .expect("Unknown muscle in fixture");
  }
  state.take_dirty();
  state
}

/// Weekly feedback with `(mmc, pump, disruption)` stimulus ratings and no
/// joint or illness signals
pub fn feedback(soreness: i32, performance: i32, stimulus: (i32, i32, i32)) -> MuscleFeedback {
  let (mmc, pump, disruption) = stimulus;
  MuscleFeedback {
    stimulus: StimulusFeedback { mmc, pump, disruption },
    soreness,
    performance,
    ..Default::default()
  }
}

pub fn muscle(name: &str) -> MuscleGroupId {
  MuscleGroupId::from(name)
}

/// RIRs, ratios and load factors are compared to three decimals
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
  assert!(
    (actual - expected).abs() < 1e-3,
    "expected {expected}, got {actual}"
  );
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_test_state_starts_empty() {
    let state = setup_test_state().await;

    assert!(storage::list_entries(&state.db).await.unwrap().is_empty());
    assert_eq!(state.engine.lock().await.volume().week_no(), 1);
  }

  #[tokio::test]
  async fn test_seed_legacy_keys() {
    let pool = setup_test_db().await;
    seed_legacy_keys(&pool).await;

    let entries = storage::list_entries(&pool).await.expect("Failed to list keys");
    assert_eq!(entries.len(), 3);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_state_factories() {
    let state = state_with_sets(&[("Chest", 20), ("Quads", 4)]);
    assert_eq!(state.weekly_sets("Chest").unwrap(), 20);
    assert_eq!(state.weekly_sets("Quads").unwrap(), 4);
    assert!(!state.is_dirty());

    let fb = feedback(2, 1, (3, 2, 1));
    assert_eq!(fb.stimulus.pump, 2);
    assert_eq!(muscle("Chest").as_str(), "Chest");
  }
}
