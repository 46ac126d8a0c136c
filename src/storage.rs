//! Key-value persistence for the engine state
//!
//! The whole aggregate lives as one JSON snapshot under `STORAGE_KEY` in the
//! `kv_store` table. Older installs wrote one key per muscle; those are folded
//! into the snapshot by `migrate_legacy` and then removed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::MuscleCatalog;
use crate::error::EngineError;
use crate::state::PeriodizationState;

pub const STORAGE_KEY: &str = "rp-training-state";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
    pub updated_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Raw key-value access
// ---------------------------------------------------------------------------

pub async fn load_value(pool: &SqlitePool, key: &str) -> Result<Option<String>, EngineError> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

/// Insert or overwrite `key`
pub async fn store_value(pool: &SqlitePool, key: &str, value: &str) -> Result<(), EngineError> {
    let updated_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(&updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns whether a row was deleted
pub async fn remove_value(pool: &SqlitePool, key: &str) -> Result<bool, EngineError> {
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_entries(pool: &SqlitePool) -> Result<Vec<KvEntry>, EngineError> {
    let rows = sqlx::query("SELECT key, value, updated_at FROM kv_store ORDER BY key")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let updated_at: Option<String> = row.get("updated_at");
            KvEntry {
                key: row.get("key"),
                value: row.get("value"),
                updated_at: updated_at.and_then(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .map(|dt| dt.with_timezone(&Utc))
                        .ok()
                }),
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

pub async fn save_state(pool: &SqlitePool, state: &PeriodizationState) -> Result<(), EngineError> {
    let json = state.to_json()?;
    store_value(pool, STORAGE_KEY, &json).await?;
    debug!(bytes = json.len(), "Saved training state");
    Ok(())
}

/// Load the snapshot, or a fresh state when there is none. A snapshot that
/// does not parse is logged and replaced by defaults; database failures
/// still propagate.
pub async fn load_state(
    pool: &SqlitePool,
    catalog: &MuscleCatalog,
    meso_len: u32,
) -> Result<PeriodizationState, EngineError> {
    let Some(json) = load_value(pool, STORAGE_KEY).await? else {
        debug!("No saved training state, using defaults");
        return PeriodizationState::new(catalog, meso_len);
    };

    match PeriodizationState::from_json(&json, catalog, meso_len) {
        Ok(state) => {
            debug!(
                week_no = state.volume().week_no(),
                block_no = state.volume().block_no(),
                "Loaded training state"
            );
            Ok(state)
        }
        Err(e) => {
            warn!("Saved training state is unreadable, using defaults: {}", e);
            PeriodizationState::new(catalog, meso_len)
        }
    }
}

/// Fold legacy per-muscle keys into `state`, delete them and save once if
/// anything was folded. Returns the number of keys removed.
pub async fn migrate_legacy(pool: &SqlitePool, state: &mut PeriodizationState) -> Result<usize, EngineError> {
    let entries: BTreeMap<String, String> = list_entries(pool)
        .await?
        .into_iter()
        .filter(|entry| entry.key != STORAGE_KEY)
        .map(|entry| (entry.key, entry.value))
        .collect();

    if entries.is_empty() {
        return Ok(0);
    }

    let consumed = state.fold_legacy_values(&entries);
    if consumed.is_empty() {
        return Ok(0);
    }

    for key in &consumed {
        remove_value(pool, key).await?;
    }
    save_state(pool, state).await?;
    state.take_dirty();

    info!(keys = consumed.len(), "Migrated legacy training data");
    Ok(consumed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DietPhase;
    use crate::test_utils::{seed_legacy_keys, setup_test_db, teardown_test_db};

    #[tokio::test]
    async fn test_store_and_load_value() {
        let pool = setup_test_db().await;

        assert_eq!(load_value(&pool, "theme").await.unwrap(), None);

        store_value(&pool, "theme", "dark").await.unwrap();
        store_value(&pool, "theme", "light").await.unwrap();
        assert_eq!(load_value(&pool, "theme").await.unwrap(), Some("light".to_string()));

        let entries = list_entries(&pool).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].updated_at.is_some());

        assert!(remove_value(&pool, "theme").await.unwrap());
        assert!(!remove_value(&pool, "theme").await.unwrap());

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_load_state_defaults_when_missing() {
        let pool = setup_test_db().await;

        let state = load_state(&pool, &MuscleCatalog::default(), 4).await.unwrap();
        assert_eq!(state.volume().week_no(), 1);
        assert_eq!(state.weekly_sets("Chest").unwrap(), 6);

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_save_and_load_state() {
        let pool = setup_test_db().await;
        let catalog = MuscleCatalog::default();

        let mut state = PeriodizationState::new(&catalog, 4).unwrap();
        state.update_weekly_sets("Chest", 15).unwrap();
        state.set_diet_phase(DietPhase::Cut);
        state.next_week();
        save_state(&pool, &state).await.unwrap();

        let loaded = load_state(&pool, &catalog, 4).await.unwrap();
        assert_eq!(loaded.to_snapshot(), state.to_snapshot());

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_load_state_recovers_from_corrupt_snapshot() {
        let pool = setup_test_db().await;
        store_value(&pool, STORAGE_KEY, "{not json").await.unwrap();

        let state = load_state(&pool, &MuscleCatalog::default(), 4).await.unwrap();
        assert_eq!(state.volume().week_no(), 1);
        assert_eq!(state.diet_phase(), DietPhase::Maintenance);

        teardown_test_db(pool).await;
    }

    #[tokio::test]
    async fn test_migrate_legacy_folds_and_deletes() {
        let pool = setup_test_db().await;
        seed_legacy_keys(&pool).await;
        store_value(&pool, "theme", "dark").await.unwrap();

        let mut state = PeriodizationState::new(&MuscleCatalog::default(), 4).unwrap();
        let migrated = migrate_legacy(&pool, &mut state).await.unwrap();

        assert_eq!(migrated, 3);
        assert_eq!(state.weekly_sets("Chest").unwrap(), 12);
        assert_eq!(state.landmarks("Back").unwrap().mev, 12);
        assert_eq!(state.landmarks("Back").unwrap().mrv, 24);
        assert!(!state.is_dirty());

        // Legacy keys gone, unrelated keys kept, snapshot written
        let keys: Vec<String> = list_entries(&pool).await.unwrap().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![STORAGE_KEY.to_string(), "theme".to_string()]);

        let reloaded = load_state(&pool, &MuscleCatalog::default(), 4).await.unwrap();
        assert_eq!(reloaded.weekly_sets("Chest").unwrap(), 12);

        // Nothing left to migrate
        assert_eq!(migrate_legacy(&pool, &mut state).await.unwrap(), 0);

        teardown_test_db(pool).await;
    }
}
