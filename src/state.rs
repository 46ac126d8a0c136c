//! Periodization State
//!
//! The aggregate root. Owns the landmark store, the weekly volume tracker
//! and the deload engine, plus the phase flags and per-muscle baselines.
//! Every method is synchronous; mutations set a dirty flag that the command
//! layer checks before writing the snapshot back to storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, MuscleCatalog};
use crate::deload::{DeloadAssessment, DeloadDecisionEngine, DeloadPlan, DeloadStrategyResolver};
use crate::effort::{
    self, EffortCheck, EffortProgression, SessionEffort, TargetRir, WeeklyEffortSummary,
    DEFAULT_END_RIR, DEFAULT_RIR_TOLERANCE, DEFAULT_START_RIR,
};
use crate::error::EngineError;
use crate::fatigue::{self, FatigueAccumulation, FatigueSignals, WeeklyFatigueData, DEFAULT_BASELINE_STRENGTH};
use crate::frequency::{self, FrequencyAnalysis, FrequencyConstraints, FrequencyPlan};
use crate::landmarks::LandmarkStore;
use crate::models::{
    DietPhase, LandmarkPatch, MuscleGroupId, StateSnapshot, StateSummary, TrainingPhase, VolumeLandmarks,
};
use crate::stimulus::{
    self, ProgressionAction, ProgressionFeedback, RecoveryVolume, StimulusFeedback, VolumeAnalysis,
    VolumeInputCheck, VolumeProgression,
};
use crate::validation::{self, MesocycleValidation, TrainingGoal};
use crate::volume::{classify, VolumeStatus, WeekRollover, WeeklyVolumeTracker};

/// Legacy per-muscle keys written before the single snapshot record existed
const LEGACY_WEEK_PREFIX: &str = "week-1-";
const LEGACY_MEV_SUFFIX: &str = "-MEV";
const LEGACY_MRV_SUFFIX: &str = "-MRV";

// ---------------------------------------------------------------------------
/// Weekly Feedback
// ---------------------------------------------------------------------------

/// End-of-week feedback for one muscle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MuscleFeedback {
    pub stimulus: StimulusFeedback,
    /// 0 none .. 3 high
    pub soreness: i32,
    /// 0 worse .. 3 much better
    pub performance: i32,
    pub joint_ache: i32,
    /// Performance vs last session; negative means worse
    pub perf_change: i32,
    pub has_illness: bool,
    pub last_load: Option<f64>,
}

impl MuscleFeedback {
    fn progression_feedback(&self) -> ProgressionFeedback {
        ProgressionFeedback {
            stimulus: self.stimulus,
            soreness: self.soreness,
            performance: self.performance,
            has_illness: self.has_illness,
        }
    }

    fn fatigue_signals(&self) -> FatigueSignals {
        FatigueSignals {
            soreness: self.soreness,
            joint_ache: self.joint_ache,
            perf_change: self.perf_change,
            pump: self.stimulus.pump,
            disruption: self.stimulus.disruption,
            last_load: self.last_load,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionLogEntry {
    pub previous_sets: u32,
    pub current_sets: u32,
    pub set_change: i64,
    pub action: ProgressionAction,
    pub advice: String,
    pub status: VolumeStatus,
    pub stimulus_score: u32,
    pub high_fatigue: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyFeedbackReport {
    pub progression_log: BTreeMap<MuscleGroupId, ProgressionLogEntry>,
    pub deload_triggered: bool,
    pub deload: Option<DeloadPlan>,
    pub mrv_hits: u32,
    pub recommendation: String,
}

// ---------------------------------------------------------------------------
/// Diet Phase Info
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietRecommendations {
    pub volume: String,
    pub intensity: String,
    pub recovery: String,
    pub progression: String,
}

impl DietRecommendations {
    pub fn for_phase(phase: DietPhase) -> Self {
        let (volume, intensity, recovery, progression) = match phase {
            DietPhase::Bulk => (
                "Start conservative with volume - growth stimulus is easier to achieve",
                "Focus on progressive overload with controlled increases",
                "Expect better recovery due to caloric surplus",
                "Be aggressive with load progression, conservative with volume",
            ),
            DietPhase::Cut => (
                "Higher volume may be needed for muscle retention",
                "Maintain intensity but expect reduced capacity",
                "Recovery will be impaired - monitor fatigue closely",
                "Prioritize maintaining strength over gaining",
            ),
            DietPhase::Maintenance => (
                "Standard volume recommendations apply",
                "Balance volume and intensity progression",
                "Normal recovery patterns expected",
                "Follow standard progression algorithms",
            ),
        };

        Self {
            volume: volume.to_string(),
            intensity: intensity.to_string(),
            recovery: recovery.to_string(),
            progression: progression.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietLandmarks {
    pub original: BTreeMap<MuscleGroupId, VolumeLandmarks>,
    pub adjusted: BTreeMap<MuscleGroupId, VolumeLandmarks>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPhaseInfo {
    pub current: DietPhase,
    pub landmarks: DietLandmarks,
    pub recommendations: DietRecommendations,
}

// ---------------------------------------------------------------------------
/// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PeriodizationState {
    landmarks: LandmarkStore,
    volume: WeeklyVolumeTracker,
    deload: DeloadDecisionEngine,
    diet_phase: DietPhase,
    deload_phase: bool,
    resensitization_phase: bool,
    /// Working loads as a fraction of normal; below 1 only while deloading
    load_reduction: f64,
    baseline_strength: BTreeMap<MuscleGroupId, f64>,
    dirty: bool,
}

impl PeriodizationState {
    /// Fresh state: week 1 of block 1, maintenance, every muscle at MEV
    pub fn new(catalog: &MuscleCatalog, meso_len: u32) -> Result<Self, EngineError> {
        let landmarks = LandmarkStore::new(catalog.landmarks())?;
        let volume = WeeklyVolumeTracker::seeded(&landmarks, meso_len);
        let baseline_strength = landmarks
            .muscles()
            .map(|muscle| (muscle.clone(), DEFAULT_BASELINE_STRENGTH))
            .collect();

        Ok(Self {
            landmarks,
            volume,
            deload: DeloadDecisionEngine::new(catalog.major_muscles()),
            diet_phase: DietPhase::Maintenance,
            deload_phase: false,
            resensitization_phase: false,
            load_reduction: 1.0,
            baseline_strength,
            dirty: false,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Self::new(&config.catalog, config.meso_len)
    }

    /// Swap in a muscle-specific deload strategy, keeping the major muscles
    pub fn with_resolver(mut self, resolver: Arc<dyn DeloadStrategyResolver>) -> Self {
        let majors = self.deload.major_muscles().to_vec();
        self.deload = DeloadDecisionEngine::with_resolver(resolver, majors);
        self
    }

    // -- accessors --

    pub fn landmark_store(&self) -> &LandmarkStore {
        &self.landmarks
    }

    pub fn volume(&self) -> &WeeklyVolumeTracker {
        &self.volume
    }

    pub fn deload_engine(&self) -> &DeloadDecisionEngine {
        &self.deload
    }

    pub fn diet_phase(&self) -> DietPhase {
        self.diet_phase
    }

    pub fn deload_phase(&self) -> bool {
        self.deload_phase
    }

    pub fn resensitization_phase(&self) -> bool {
        self.resensitization_phase
    }

    pub fn load_reduction(&self) -> f64 {
        self.load_reduction
    }

    pub fn landmarks(&self, muscle: &str) -> Result<VolumeLandmarks, EngineError> {
        self.landmarks.get(muscle)
    }

    pub fn weekly_sets(&self, muscle: &str) -> Result<u32, EngineError> {
        self.landmarks.get(muscle)?;
        Ok(self.volume.sets(muscle))
    }

    pub fn volume_status(&self, muscle: &str) -> Result<VolumeStatus, EngineError> {
        let lm = self.landmarks.get(muscle)?;
        Ok(classify(self.volume.sets(muscle), &lm))
    }

    pub fn baseline_strength(&self, muscle: &str) -> f64 {
        self.baseline_strength
            .get(muscle)
            .copied()
            .unwrap_or(DEFAULT_BASELINE_STRENGTH)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether anything changed since the last call and clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn update_weekly_sets(&mut self, muscle: &str, sets: i64) -> Result<u32, EngineError> {
        let stored = self.volume.set_weekly_sets(&self.landmarks, muscle, sets)?;
        self.dirty = true;
        Ok(stored)
    }

    pub fn add_sets(&mut self, muscle: &str, delta: i64) -> Result<u32, EngineError> {
        let stored = self.volume.add_sets(&self.landmarks, muscle, delta)?;
        self.dirty = true;
        Ok(stored)
    }

    /// Roll the week. A deload lasts exactly one week; resensitization lasts
    /// until the block it started in is over.
    pub fn next_week(&mut self) -> WeekRollover {
        let rollover = self.volume.roll_week(&self.landmarks);

        if self.deload_phase {
            self.deload_phase = false;
            self.load_reduction = 1.0;
            info!(week_no = rollover.week_no, "Deload week complete");
        }
        if rollover.block_completed && self.resensitization_phase {
            self.resensitization_phase = false;
            info!(block_no = rollover.block_no, "Resensitization complete");
        }

        self.dirty = true;
        rollover
    }

    pub fn start_deload(&mut self) -> DeloadPlan {
        let plan = self.deload.start_deload(&mut self.volume, &self.landmarks);
        self.deload_phase = true;
        self.load_reduction = plan.load_reduction;
        self.dirty = true;
        plan
    }

    pub fn start_resensitization(&mut self) {
        self.deload.start_resensitization(&mut self.volume, &self.landmarks);
        self.resensitization_phase = true;
        self.load_reduction = 1.0;
        self.dirty = true;
    }

    /// Re-derive the landmark table from the originals for `phase`
    pub fn set_diet_phase(&mut self, phase: DietPhase) {
        let previous = self.diet_phase;
        self.landmarks.apply_diet_phase(phase);
        self.diet_phase = phase;
        self.dirty = true;
        info!(%previous, current = %phase, "Diet phase changed");
    }

    pub fn update_volume_landmarks(
        &mut self,
        muscle: &str,
        patch: &LandmarkPatch,
    ) -> Result<VolumeLandmarks, EngineError> {
        let updated = self.landmarks.update(muscle, patch)?;
        self.dirty = true;
        Ok(updated)
    }

    pub fn hit_mrv(&mut self, muscle: &str) -> Result<bool, EngineError> {
        let at_mrv = self.deload.hit_mrv(&mut self.volume, &self.landmarks, muscle)?;
        self.dirty = true;
        Ok(at_mrv)
    }

    /// Record the reference load for strength-drop checks. Non-finite or
    /// non-positive loads are rejected since the snapshot cannot hold them.
    pub fn set_baseline_strength(&mut self, muscle: &str, load: f64) -> Result<(), EngineError> {
        self.landmarks.get(muscle)?;
        if !load.is_finite() || load <= 0.0 {
            return Err(EngineError::InvalidBaselineLoad {
                muscle: muscle.to_string(),
                load,
            });
        }
        self.baseline_strength.insert(MuscleGroupId::from(muscle), load);
        self.dirty = true;
        Ok(())
    }

    /// Change the nominal mesocycle length. A current week past the new
    /// length becomes the last week of the mesocycle.
    pub fn set_meso_length(
        &mut self,
        weeks: u32,
        goal: TrainingGoal,
    ) -> Result<MesocycleValidation, EngineError> {
        if weeks < 1 {
            return Err(EngineError::Config(
                "Mesocycle length must be at least 1 week".to_string(),
            ));
        }
        self.volume.set_meso_len(weeks);
        self.dirty = true;
        Ok(validation::validate_mesocycle_length(weeks as i64, goal))
    }

    pub fn reset_week(&mut self) {
        self.volume.reset_to_mev(&self.landmarks);
        self.dirty = true;
    }

    /// Apply a week of per-muscle feedback.
    ///
    /// High-fatigue muscles are flagged for recovery and get a recovery
    /// session; every muscle then takes its volume progression, and any muscle
    /// that ends at/above MRV is flagged. A deload starts if the resulting
    /// state calls for one. Unknown muscles fail the whole call before anything
    /// is applied.
    pub fn process_weekly_feedback(
        &mut self,
        feedback: &BTreeMap<MuscleGroupId, MuscleFeedback>,
    ) -> Result<WeeklyFeedbackReport, EngineError> {
        for muscle in feedback.keys() {
            self.landmarks.get(muscle.as_str())?;
        }

        let mut progression_log = BTreeMap::new();
        let mut mrv_hits = 0;

        for (muscle, entry) in feedback {
            let lm = self.landmarks.get(muscle.as_str())?;
            let baseline = self.baseline_strength(muscle.as_str());

            let high_fatigue = fatigue::is_high_fatigue(&entry.fatigue_signals(), baseline);
            if high_fatigue {
                self.deload.hit_mrv(&mut self.volume, &self.landmarks, muscle.as_str())?;
                self.volume.record_recovery_session();
                mrv_hits += 1;
                debug!(muscle = %muscle, "High fatigue, forcing recovery session");
            }

            let current = self.volume.sets(muscle.as_str());
            let mut progression =
                stimulus::volume_progression(muscle, current, &lm, &entry.progression_feedback());
            if high_fatigue && progression.action != ProgressionAction::Recovery {
                let recovery = stimulus::calculate_recovery_volume(muscle, &lm, entry.has_illness);
                progression.action = ProgressionAction::Recovery;
                progression.projected_sets = recovery.recommended_sets;
                progression.set_change = recovery.recommended_sets as i64 - current as i64;
                progression.advice = format!(
                    "High fatigue: recovery session at {} sets ({})",
                    recovery.recommended_sets, recovery.reasoning
                );
            }

            let stored = self.volume.set_weekly_sets(
                &self.landmarks,
                muscle.as_str(),
                progression.projected_sets as i64,
            )?;

            if stored >= lm.mrv {
                self.deload.hit_mrv(&mut self.volume, &self.landmarks, muscle.as_str())?;
                mrv_hits += 1;
            }

            progression_log.insert(
                muscle.clone(),
                ProgressionLogEntry {
                    previous_sets: self.volume.last_week(muscle.as_str()).unwrap_or(lm.mev),
                    current_sets: stored,
                    set_change: progression.set_change,
                    action: progression.action,
                    advice: progression.advice,
                    status: classify(stored, &lm),
                    stimulus_score: progression.stimulus_score,
                    high_fatigue,
                },
            );
        }

        self.dirty = true;

        let deload = if self.should_deload() {
            Some(self.start_deload())
        } else {
            None
        };
        let deload_triggered = deload.is_some();

        info!(
            muscles = progression_log.len(),
            mrv_hits,
            deload_triggered,
            "Processed weekly feedback"
        );

        Ok(WeeklyFeedbackReport {
            progression_log,
            deload_triggered,
            deload,
            mrv_hits,
            recommendation: if deload_triggered {
                "Deload phase initiated".to_string()
            } else {
                "Continue progression".to_string()
            },
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn target_rir(&self) -> TargetRir {
        effort::target_rir(
            self.volume.week_no(),
            self.volume.meso_len(),
            DEFAULT_START_RIR,
            DEFAULT_END_RIR,
        )
    }

    pub fn assess_deload(&self) -> DeloadAssessment {
        self.deload.assess(&self.volume, &self.landmarks)
    }

    pub fn should_deload(&self) -> bool {
        self.deload.should_deload(&self.volume, &self.landmarks)
    }

    pub fn should_resensitize(&self) -> bool {
        self.deload.should_resensitize(&self.volume)
    }

    pub fn adaptive_meso_length(&self) -> u32 {
        self.deload.adaptive_meso_length(&self.volume, &self.landmarks)
    }

    pub fn current_phase(&self) -> TrainingPhase {
        if self.deload_phase {
            TrainingPhase::Deload
        } else if self.resensitization_phase {
            TrainingPhase::Resensitization
        } else {
            TrainingPhase::Accumulation
        }
    }

    pub fn state_summary(&self) -> StateSummary {
        StateSummary {
            week: self.volume.week_no(),
            meso: self.volume.meso_len(),
            block: self.volume.block_no(),
            target_rir: self.target_rir().target_rir,
            deload_recommended: self.should_deload(),
            resensitization_recommended: self.should_resensitize(),
            current_phase: self.current_phase(),
        }
    }

    /// Status of `sets`, or of the tracked sets when `None`
    pub fn analyze_volume_status(&self, muscle: &str, sets: Option<u32>) -> Result<VolumeAnalysis, EngineError> {
        let lm = self.landmarks.get(muscle)?;
        let sets = sets.unwrap_or_else(|| self.volume.sets(muscle));
        Ok(stimulus::analyze_volume_status(&MuscleGroupId::from(muscle), sets, &lm))
    }

    pub fn validate_volume_input(&self, muscle: &str, proposed_sets: i64) -> Result<VolumeInputCheck, EngineError> {
        let lm = self.landmarks.get(muscle)?;
        Ok(stimulus::validate_volume_input(proposed_sets, &lm))
    }

    pub fn calculate_recovery_volume(&self, muscle: &str, has_illness: bool) -> Result<RecoveryVolume, EngineError> {
        let lm = self.landmarks.get(muscle)?;
        Ok(stimulus::calculate_recovery_volume(&MuscleGroupId::from(muscle), &lm, has_illness))
    }

    pub fn volume_progression(
        &self,
        muscle: &str,
        feedback: &ProgressionFeedback,
    ) -> Result<VolumeProgression, EngineError> {
        let lm = self.landmarks.get(muscle)?;
        Ok(stimulus::volume_progression(
            &MuscleGroupId::from(muscle),
            self.volume.sets(muscle),
            &lm,
            feedback,
        ))
    }

    pub fn analyze_frequency(
        &self,
        soreness_recovery_days: f64,
        session_gap_days: f64,
        muscle: Option<&str>,
    ) -> Result<FrequencyAnalysis, EngineError> {
        let context = match muscle {
            Some(name) => Some((MuscleGroupId::from(name), self.volume_status(name)?)),
            None => None,
        };
        Ok(frequency::analyze_frequency(
            soreness_recovery_days,
            session_gap_days,
            context.as_ref().map(|(id, status)| (id, *status)),
        ))
    }

    pub fn calculate_optimal_frequency(
        &self,
        muscle: &str,
        constraints: &FrequencyConstraints,
    ) -> Result<FrequencyPlan, EngineError> {
        let lm = self.landmarks.get(muscle)?;
        let volume = constraints
            .current_volume
            .unwrap_or_else(|| self.volume.sets(muscle));
        Ok(frequency::calculate_optimal_frequency(
            &MuscleGroupId::from(muscle),
            &lm,
            volume,
            constraints,
        ))
    }

    /// Compare an actual RIR against `target` (this week's target by default)
    pub fn validate_effort_level(&self, actual_rir: f64, target: Option<f64>, tolerance: Option<f64>) -> EffortCheck {
        effort::validate_effort_level(
            actual_rir,
            target.unwrap_or_else(|| self.target_rir().target_rir),
            tolerance.unwrap_or(DEFAULT_RIR_TOLERANCE),
        )
    }

    pub fn effort_progression(&self, muscle: &str, last_session: &SessionEffort) -> Result<EffortProgression, EngineError> {
        let status = self.volume_status(muscle)?;
        Ok(effort::effort_progression(
            &MuscleGroupId::from(muscle),
            self.target_rir().target_rir,
            status,
            last_session,
        ))
    }

    pub fn weekly_effort_summary(&self) -> WeeklyEffortSummary {
        effort::weekly_effort_summary(
            self.volume.week_no(),
            self.volume.meso_len(),
            self.target_rir().target_rir,
        )
    }

    /// True when `last_load` is more than 3% under the muscle's baseline
    pub fn rep_strength_drop(&self, muscle: &str, last_load: f64) -> Result<bool, EngineError> {
        self.landmarks.get(muscle)?;
        Ok(fatigue::rep_strength_drop(last_load, self.baseline_strength(muscle)))
    }

    pub fn is_high_fatigue(&self, muscle: &str, signals: &FatigueSignals) -> Result<bool, EngineError> {
        self.landmarks.get(muscle)?;
        Ok(fatigue::is_high_fatigue(signals, self.baseline_strength(muscle)))
    }

    /// Fatigue score for the week. The recovery and MRV-streak counters come
    /// from the tracker, not from `data`.
    pub fn assess_fatigue_accumulation(&self, data: &WeeklyFatigueData) -> FatigueAccumulation {
        let data = WeeklyFatigueData {
            muscles_needing_recovery: self.volume.total_muscles_needing_recovery(),
            consecutive_mrv_weeks: self.volume.consecutive_mrv_weeks(),
            ..*data
        };
        fatigue::assess_fatigue_accumulation(&data)
    }

    pub fn diet_phase_info(&self) -> DietPhaseInfo {
        DietPhaseInfo {
            current: self.diet_phase,
            landmarks: DietLandmarks {
                original: self.landmarks.original_table().clone(),
                adjusted: self.landmarks.current_table().clone(),
            },
            recommendations: DietRecommendations::for_phase(self.diet_phase),
        }
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    pub fn to_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            volume_landmarks: self.landmarks.current_table().clone(),
            original_landmarks: self.landmarks.original_table().clone(),
            week_no: Some(self.volume.week_no),
            meso_len: Some(self.volume.meso_len),
            block_no: Some(self.volume.block_no),
            deload_phase: Some(self.deload_phase),
            resensitization_phase: Some(self.resensitization_phase),
            diet_phase: Some(self.diet_phase),
            load_reduction: Some(self.load_reduction),
            current_week_sets: self.volume.current_week_sets.clone(),
            last_week_sets: self.volume.last_week_sets.clone(),
            baseline_strength: self.baseline_strength.clone(),
            consecutive_mrv_weeks: Some(self.volume.consecutive_mrv_weeks),
            recovery_sessions_this_week: Some(self.volume.recovery_sessions_this_week),
            total_muscles_needing_recovery: Some(self.volume.total_muscles_needing_recovery),
        }
    }

    /// Fresh state with whatever the snapshot carries merged on top
    pub fn from_snapshot(
        snapshot: StateSnapshot,
        catalog: &MuscleCatalog,
        meso_len: u32,
    ) -> Result<Self, EngineError> {
        let mut state = Self::new(catalog, meso_len)?;
        state.merge_snapshot(snapshot);
        state.dirty = false;
        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str, catalog: &MuscleCatalog, meso_len: u32) -> Result<Self, EngineError> {
        let snapshot: StateSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, catalog, meso_len)
    }

    fn merge_snapshot(&mut self, snapshot: StateSnapshot) {
        self.merge_landmarks(&snapshot);

        let tracker = &mut self.volume;
        if let Some(meso_len) = snapshot.meso_len {
            tracker.set_meso_len(meso_len);
        }
        if let Some(week_no) = snapshot.week_no {
            if week_no > tracker.meso_len {
                warn!(week_no, meso_len = tracker.meso_len, "Persisted week past mesocycle end, clamping");
            }
            tracker.week_no = week_no.clamp(1, tracker.meso_len);
        }
        if let Some(block_no) = snapshot.block_no {
            tracker.block_no = block_no.max(1);
        }
        tracker.consecutive_mrv_weeks = snapshot.consecutive_mrv_weeks.unwrap_or(0);
        tracker.recovery_sessions_this_week = snapshot.recovery_sessions_this_week.unwrap_or(0);
        tracker.total_muscles_needing_recovery = snapshot.total_muscles_needing_recovery.unwrap_or(0);

        // Muscles absent from the record keep their MEV seed
        for (muscle, sets) in snapshot.current_week_sets {
            if self.landmarks.contains(muscle.as_str()) {
                tracker.current_week_sets.insert(muscle, sets);
            } else {
                debug!(muscle = %muscle, "Ignoring sets for unknown muscle");
            }
        }
        for (muscle, sets) in snapshot.last_week_sets {
            if self.landmarks.contains(muscle.as_str()) {
                tracker.last_week_sets.insert(muscle, sets);
            }
        }

        for (muscle, load) in snapshot.baseline_strength {
            if self.landmarks.contains(muscle.as_str()) && load.is_finite() && load > 0.0 {
                self.baseline_strength.insert(muscle, load);
            }
        }

        self.deload_phase = snapshot.deload_phase.unwrap_or(false);
        self.resensitization_phase = snapshot.resensitization_phase.unwrap_or(false);
        self.diet_phase = snapshot.diet_phase.unwrap_or_default();
        self.load_reduction = snapshot
            .load_reduction
            .filter(|r| r.is_finite() && *r > 0.0 && *r <= 1.0)
            .unwrap_or(1.0);
    }

    /// Persisted landmarks replace the defaults muscle by muscle; a muscle
    /// whose persisted values are out of order keeps its default.
    fn merge_landmarks(&mut self, snapshot: &StateSnapshot) {
        if snapshot.volume_landmarks.is_empty() {
            return;
        }

        let mut current = self.landmarks.current_table().clone();
        let mut original = self.landmarks.original_table().clone();

        for (muscle, lm) in &snapshot.volume_landmarks {
            if lm.is_ordered() {
                current.insert(muscle.clone(), *lm);
            } else {
                warn!(muscle = %muscle, landmarks = ?lm, "Persisted landmarks out of order, using defaults");
            }
        }
        for (muscle, lm) in &snapshot.original_landmarks {
            if lm.is_ordered() {
                original.insert(muscle.clone(), *lm);
            }
        }

        match LandmarkStore::from_parts(current, original) {
            Ok(store) => {
                // Muscles only the record knows about get the usual seed
                for (muscle, lm) in store.iter() {
                    if !self.landmarks.contains(muscle.as_str()) {
                        self.volume.current_week_sets.insert(muscle.clone(), lm.mev);
                        self.volume.last_week_sets.insert(muscle.clone(), lm.mev);
                        self.baseline_strength.insert(muscle.clone(), DEFAULT_BASELINE_STRENGTH);
                    }
                }
                self.landmarks = store;
            }
            Err(e) => warn!("Persisted landmarks rejected, using defaults: {}", e),
        }
    }

    /// Fold values stored under legacy per-muscle keys into the state.
    ///
    /// Returns every legacy key that was recognised, including ones whose
    /// value could not be used, so the caller can delete them all.
    pub fn fold_legacy_values(&mut self, entries: &BTreeMap<String, String>) -> Vec<String> {
        let mut consumed = Vec::new();
        let mut patches: BTreeMap<MuscleGroupId, LandmarkPatch> = BTreeMap::new();
        let mut changed = false;

        let muscles: Vec<MuscleGroupId> = self.landmarks.muscles().cloned().collect();
        for muscle in &muscles {
            let week_key = format!("{}{}", LEGACY_WEEK_PREFIX, muscle);
            if let Some(raw) = entries.get(&week_key) {
                consumed.push(week_key.clone());
                match raw.trim().parse::<i64>() {
                    Ok(sets) => {
                        if self.volume.set_weekly_sets(&self.landmarks, muscle.as_str(), sets).is_ok() {
                            changed = true;
                        }
                    }
                    Err(_) => warn!(key = %week_key, value = %raw, "Dropping unparseable legacy value"),
                }
            }

            for (suffix, is_mev) in [(LEGACY_MEV_SUFFIX, true), (LEGACY_MRV_SUFFIX, false)] {
                let key = format!("{}{}", muscle, suffix);
                let Some(raw) = entries.get(&key) else {
                    continue;
                };
                consumed.push(key.clone());
                match raw.trim().parse::<u32>() {
                    Ok(value) => {
                        let patch = patches.entry(muscle.clone()).or_default();
                        if is_mev {
                            patch.mev = Some(value);
                        } else {
                            patch.mrv = Some(value);
                        }
                    }
                    Err(_) => warn!(key = %key, value = %raw, "Dropping unparseable legacy value"),
                }
            }
        }

        for (muscle, patch) in &patches {
            match self.landmarks.update(muscle.as_str(), patch) {
                Ok(_) => changed = true,
                Err(e) => warn!(muscle = %muscle, "Dropping legacy landmarks: {}", e),
            }
        }

        if changed {
            self.dirty = true;
        }
        if !consumed.is_empty() {
            info!(keys = consumed.len(), changed, "Folded legacy keys");
        }
        consumed
    }
}
