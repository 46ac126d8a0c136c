//! Mutation commands. Each one locks the engine, applies the change and
//! writes the snapshot back before returning.

use std::collections::BTreeMap;

use super::mutate;
use crate::db::AppState;
use crate::deload::DeloadPlan;
use crate::models::{DietPhase, LandmarkPatch, MuscleGroupId, VolumeLandmarks};
use crate::state::{MuscleFeedback, WeeklyFeedbackReport};
use crate::validation::{MesocycleValidation, TrainingGoal};
use crate::volume::WeekRollover;

/// Set a muscle's sets for the current week (negative input stores 0)
pub async fn update_weekly_sets(state: &AppState, muscle: String, sets: i64) -> Result<u32, String> {
    mutate(state, |engine| engine.update_weekly_sets(&muscle, sets)).await
}

pub async fn add_sets(state: &AppState, muscle: String, delta: i64) -> Result<u32, String> {
    mutate(state, |engine| engine.add_sets(&muscle, delta)).await
}

/// Close out the current week
pub async fn next_week(state: &AppState) -> Result<WeekRollover, String> {
    mutate(state, |engine| Ok(engine.next_week())).await
}

pub async fn start_deload(state: &AppState) -> Result<DeloadPlan, String> {
    mutate(state, |engine| Ok(engine.start_deload())).await
}

pub async fn start_resensitization(state: &AppState) -> Result<(), String> {
    mutate(state, |engine| {
        engine.start_resensitization();
        Ok(())
    })
    .await
}

/// Switch diet phase (`bulk`, `cut` or `maintenance`) and return the
/// adjusted landmark table
pub async fn set_diet_phase(
    state: &AppState,
    phase: String,
) -> Result<BTreeMap<MuscleGroupId, VolumeLandmarks>, String> {
    let phase: DietPhase = phase.parse().map_err(|e: crate::error::EngineError| e.to_string())?;
    mutate(state, |engine| {
        engine.set_diet_phase(phase);
        Ok(engine.landmark_store().current_table().clone())
    })
    .await
}

pub async fn update_volume_landmarks(
    state: &AppState,
    muscle: String,
    patch: LandmarkPatch,
) -> Result<VolumeLandmarks, String> {
    mutate(state, |engine| engine.update_volume_landmarks(&muscle, &patch)).await
}

/// Flag a muscle as needing recovery; true when it was already at MRV
pub async fn hit_mrv(state: &AppState, muscle: String) -> Result<bool, String> {
    mutate(state, |engine| engine.hit_mrv(&muscle)).await
}

pub async fn set_baseline_strength(state: &AppState, muscle: String, load: f64) -> Result<(), String> {
    mutate(state, |engine| engine.set_baseline_strength(&muscle, load)).await
}

pub async fn set_meso_length(
    state: &AppState,
    weeks: u32,
    goal: Option<String>,
) -> Result<MesocycleValidation, String> {
    let goal: TrainingGoal = match goal {
        Some(goal) => goal.parse().map_err(|e: crate::error::EngineError| e.to_string())?,
        None => TrainingGoal::default(),
    };
    mutate(state, |engine| engine.set_meso_length(weeks, goal)).await
}

/// Put every muscle back at its MEV
pub async fn reset_week(state: &AppState) -> Result<(), String> {
    mutate(state, |engine| {
        engine.reset_week();
        Ok(())
    })
    .await
}

pub async fn process_weekly_feedback(
    state: &AppState,
    feedback: BTreeMap<MuscleGroupId, MuscleFeedback>,
) -> Result<WeeklyFeedbackReport, String> {
    mutate(state, |engine| engine.process_weekly_feedback(&feedback)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuscleCatalog;
    use crate::models::TrainingPhase;
    use crate::storage;
    use crate::test_utils::{feedback, setup_test_state};

    async fn saved(state: &AppState) -> crate::state::PeriodizationState {
        storage::load_state(&state.db, &MuscleCatalog::default(), 4)
            .await
            .expect("saved state")
    }

    #[tokio::test]
    async fn test_set_and_add_sets_persist() {
        let state = setup_test_state().await;

        assert_eq!(update_weekly_sets(&state, "Quads".into(), 12).await.unwrap(), 12);
        assert_eq!(add_sets(&state, "Quads".into(), -3).await.unwrap(), 9);

        assert_eq!(saved(&state).await.weekly_sets("Quads").unwrap(), 9);
    }

    #[tokio::test]
    async fn test_deload_cycle_persists_phase() {
        let state = setup_test_state().await;

        let plan = start_deload(&state).await.unwrap();
        assert_eq!(plan.target_sets[&MuscleGroupId::from("Chest")], 3);
        assert_eq!(saved(&state).await.current_phase(), TrainingPhase::Deload);

        let rollover = next_week(&state).await.unwrap();
        assert_eq!(rollover.week_no, 2);
        let reloaded = saved(&state).await;
        assert_eq!(reloaded.current_phase(), TrainingPhase::Accumulation);
        assert_eq!(reloaded.load_reduction(), 1.0);
    }

    #[tokio::test]
    async fn test_set_diet_phase_validates_input() {
        let state = setup_test_state().await;

        let err = set_diet_phase(&state, "recomp".into()).await.unwrap_err();
        assert!(err.contains("recomp"));

        let table = set_diet_phase(&state, "cut".into()).await.unwrap();
        let chest = table[&MuscleGroupId::from("Chest")];
        assert!(chest.mev < chest.mrv);
        assert_eq!(saved(&state).await.diet_phase(), DietPhase::Cut);
    }

    #[tokio::test]
    async fn test_update_landmarks_rejects_disorder() {
        let state = setup_test_state().await;

        let bad = LandmarkPatch {
            mv: Some(30),
            ..Default::default()
        };
        assert!(update_volume_landmarks(&state, "Chest".into(), bad).await.is_err());

        let good = LandmarkPatch {
            mrv: Some(24),
            ..Default::default()
        };
        let updated = update_volume_landmarks(&state, "Chest".into(), good).await.unwrap();
        assert_eq!(updated.mrv, 24);
        assert_eq!(saved(&state).await.landmarks("Chest").unwrap().mrv, 24);
    }

    #[tokio::test]
    async fn test_meso_length_goal_parsing() {
        let state = setup_test_state().await;

        assert!(set_meso_length(&state, 5, Some("yoga".into())).await.is_err());

        let check = set_meso_length(&state, 5, Some("strength".into())).await.unwrap();
        assert!(check.is_valid);
        assert_eq!(saved(&state).await.volume().meso_len(), 5);
    }

    #[tokio::test]
    async fn test_weekly_feedback_persists_progression() {
        let state = setup_test_state().await;

        let mut week = BTreeMap::new();
        week.insert(MuscleGroupId::from("Chest"), feedback(1, 2, (1, 1, 1)));
        let report = process_weekly_feedback(&state, week).await.unwrap();

        assert!(!report.deload_triggered);
        assert_eq!(saved(&state).await.weekly_sets("Chest").unwrap(), 8);
    }

    #[tokio::test]
    async fn test_hit_mrv_and_reset_week() {
        let state = setup_test_state().await;

        update_weekly_sets(&state, "Back".into(), 25).await.unwrap();
        assert!(hit_mrv(&state, "Back".into()).await.unwrap());
        assert_eq!(saved(&state).await.volume().consecutive_mrv_weeks(), 1);

        reset_week(&state).await.unwrap();
        assert_eq!(saved(&state).await.weekly_sets("Back").unwrap(), 10);
    }

    #[tokio::test]
    async fn test_resensitization_and_baseline() {
        let state = setup_test_state().await;

        start_resensitization(&state).await.unwrap();
        set_baseline_strength(&state, "Chest".into(), 120.0).await.unwrap();

        let reloaded = saved(&state).await;
        assert_eq!(reloaded.current_phase(), TrainingPhase::Resensitization);
        assert_eq!(reloaded.weekly_sets("Chest").unwrap(), 4);
        assert_eq!(reloaded.baseline_strength("Chest"), 120.0);
    }

    #[tokio::test]
    async fn test_non_finite_baseline_keeps_saved_progress() {
        let state = setup_test_state().await;

        update_weekly_sets(&state, "Chest".into(), 14).await.unwrap();
        next_week(&state).await.unwrap();

        let err = set_baseline_strength(&state, "Back".into(), f64::NAN).await.unwrap_err();
        assert!(err.contains("Back"));
        assert!(set_baseline_strength(&state, "Back".into(), f64::INFINITY).await.is_err());

        let reloaded = saved(&state).await;
        assert_eq!(reloaded.volume().week_no(), 2);
        assert_eq!(reloaded.volume().last_week("Chest"), Some(14));
        assert_eq!(reloaded.baseline_strength("Back"), 100.0);
    }
}
