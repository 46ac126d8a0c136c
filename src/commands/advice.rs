//! Read-only commands: summaries, advisors and input validators.

use super::query;
use crate::db::AppState;
use crate::deload::DeloadAssessment;
use crate::effort::{EffortCheck, EffortProgression, SessionEffort, TargetRir, WeeklyEffortSummary};
use crate::error::EngineError;
use crate::fatigue::{FatigueAccumulation, FatigueSignals, WeeklyFatigueData};
use crate::frequency::{FrequencyAnalysis, FrequencyConstraints, FrequencyPlan};
use crate::models::{StateSnapshot, StateSummary};
use crate::state::DietPhaseInfo;
use crate::stimulus::{
    self, MatrixAdvice, ProgressionFeedback, RecoveryVolume, StimulusFeedback, StimulusScore,
    VolumeAnalysis, VolumeInputCheck, VolumeProgression,
};
use crate::validation::{
    self, FrequencyValidation, LoadValidation, MesocycleValidation, RirValidation, SetsValidation,
    TrainingGoal,
};

fn parse_goal(goal: Option<String>) -> Result<TrainingGoal, String> {
    match goal {
        Some(goal) => goal.parse().map_err(|e: EngineError| e.to_string()),
        None => Ok(TrainingGoal::default()),
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub async fn get_state_summary(state: &AppState) -> Result<StateSummary, String> {
    query(state, |engine| Ok(engine.state_summary())).await
}

pub async fn get_snapshot(state: &AppState) -> Result<StateSnapshot, String> {
    query(state, |engine| Ok(engine.to_snapshot())).await
}

pub async fn get_deload_assessment(state: &AppState) -> Result<DeloadAssessment, String> {
    query(state, |engine| Ok(engine.assess_deload())).await
}

pub async fn get_diet_phase_info(state: &AppState) -> Result<DietPhaseInfo, String> {
    query(state, |engine| Ok(engine.diet_phase_info())).await
}

// ---------------------------------------------------------------------------
// Volume & stimulus
// ---------------------------------------------------------------------------

pub async fn analyze_volume_status(
    state: &AppState,
    muscle: String,
    sets: Option<u32>,
) -> Result<VolumeAnalysis, String> {
    query(state, |engine| engine.analyze_volume_status(&muscle, sets)).await
}

pub async fn validate_volume_input(
    state: &AppState,
    muscle: String,
    proposed_sets: i64,
) -> Result<VolumeInputCheck, String> {
    query(state, |engine| engine.validate_volume_input(&muscle, proposed_sets)).await
}

pub async fn calculate_recovery_volume(
    state: &AppState,
    muscle: String,
    has_illness: bool,
) -> Result<RecoveryVolume, String> {
    query(state, |engine| engine.calculate_recovery_volume(&muscle, has_illness)).await
}

pub async fn get_volume_progression(
    state: &AppState,
    muscle: String,
    feedback: ProgressionFeedback,
) -> Result<VolumeProgression, String> {
    query(state, |engine| engine.volume_progression(&muscle, &feedback)).await
}

/// Stateless: score pump/MMC/disruption ratings
pub fn score_stimulus(feedback: StimulusFeedback) -> StimulusScore {
    stimulus::score_stimulus(&feedback)
}

/// Stateless: soreness x performance matrix lookup
pub fn set_progression_algorithm(soreness: i32, performance: i32) -> MatrixAdvice {
    stimulus::set_progression_algorithm(soreness, performance)
}

// ---------------------------------------------------------------------------
// Effort, frequency & fatigue
// ---------------------------------------------------------------------------

pub async fn get_target_rir(state: &AppState) -> Result<TargetRir, String> {
    query(state, |engine| Ok(engine.target_rir())).await
}

pub async fn validate_effort_level(
    state: &AppState,
    actual_rir: f64,
    target_rir: Option<f64>,
    tolerance: Option<f64>,
) -> Result<EffortCheck, String> {
    query(state, |engine| Ok(engine.validate_effort_level(actual_rir, target_rir, tolerance))).await
}

pub async fn get_effort_progression(
    state: &AppState,
    muscle: String,
    last_session: SessionEffort,
) -> Result<EffortProgression, String> {
    query(state, |engine| engine.effort_progression(&muscle, &last_session)).await
}

pub async fn get_weekly_effort_summary(state: &AppState) -> Result<WeeklyEffortSummary, String> {
    query(state, |engine| Ok(engine.weekly_effort_summary())).await
}

pub async fn analyze_frequency(
    state: &AppState,
    soreness_recovery_days: f64,
    session_gap_days: f64,
    muscle: Option<String>,
) -> Result<FrequencyAnalysis, String> {
    query(state, |engine| {
        engine.analyze_frequency(soreness_recovery_days, session_gap_days, muscle.as_deref())
    })
    .await
}

pub async fn calculate_optimal_frequency(
    state: &AppState,
    muscle: String,
    constraints: FrequencyConstraints,
) -> Result<FrequencyPlan, String> {
    query(state, |engine| engine.calculate_optimal_frequency(&muscle, &constraints)).await
}

pub async fn check_high_fatigue(
    state: &AppState,
    muscle: String,
    signals: FatigueSignals,
) -> Result<bool, String> {
    query(state, |engine| engine.is_high_fatigue(&muscle, &signals)).await
}

pub async fn assess_fatigue(state: &AppState, data: WeeklyFatigueData) -> Result<FatigueAccumulation, String> {
    query(state, |engine| Ok(engine.assess_fatigue_accumulation(&data))).await
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

pub fn validate_load(percent_of_1rm: f64, goal: Option<String>) -> Result<LoadValidation, String> {
    Ok(validation::validate_load(percent_of_1rm, parse_goal(goal)?))
}

/// Validate sets against the muscle's current landmarks
pub async fn validate_sets(
    state: &AppState,
    muscle: String,
    proposed_sets: i64,
    allow_overreach: bool,
) -> Result<SetsValidation, String> {
    query(state, |engine| {
        let landmarks = engine.landmarks(&muscle)?;
        Ok(validation::validate_sets(proposed_sets, &landmarks, allow_overreach))
    })
    .await
}

pub fn validate_mesocycle_length(weeks: i64, goal: Option<String>) -> Result<MesocycleValidation, String> {
    Ok(validation::validate_mesocycle_length(weeks, parse_goal(goal)?))
}

pub fn validate_rir(actual_rir: f64, target_rir: f64, goal: Option<String>) -> Result<RirValidation, String> {
    Ok(validation::validate_rir(actual_rir, target_rir, parse_goal(goal)?))
}

pub fn validate_frequency(frequency: i64, weekly_volume: i64) -> FrequencyValidation {
    validation::validate_frequency(frequency, weekly_volume)
}
