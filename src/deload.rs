//! Deload & Resensitization Decisions
//!
//! Reads the weekly tracker and landmark store to decide when volume has to
//! come down. How far it comes down is delegated to a `DeloadStrategyResolver`;
//! the built-in `HalfMevDeload` always produces a plan, so a deload can never
//! fail to start.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::landmarks::LandmarkStore;
use crate::models::{MuscleGroupId, VolumeLandmarks};
use crate::volume::WeeklyVolumeTracker;

/// Adaptive mesocycle length never leaves this range
pub const MIN_MESO_LEN: u32 = 3;
pub const MAX_MESO_LEN: u32 = 6;

/// Resensitize every N blocks
const RESENSITIZATION_INTERVAL: u32 = 4;

/// A muscle within this many sets of MRV counts as "approaching" it
const MRV_PROXIMITY_SETS: u32 = 2;

fn near_mrv(sets: u32, landmarks: &VolumeLandmarks) -> bool {
    sets + MRV_PROXIMITY_SETS >= landmarks.mrv
}

/// Fraction of muscles at or within two sets of MRV
pub fn volume_pressure(tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> f64 {
    if landmarks.is_empty() {
        return 0.0;
    }
    let near = landmarks
        .iter()
        .filter(|(muscle, lm)| near_mrv(tracker.sets(muscle.as_str()), lm))
        .count();
    near as f64 / landmarks.len() as f64
}

/// Share of muscles flagged as needing recovery this week
pub fn recovery_pressure(tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> f64 {
    if landmarks.is_empty() {
        return 0.0;
    }
    tracker.total_muscles_needing_recovery() as f64 / landmarks.len() as f64
}

/// Overall fatigue in [0, 1]: mean position between MEV and MRV, plus
/// penalties for the MRV streak and recovery pressure.
pub fn overall_fatigue(tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> f64 {
    if landmarks.is_empty() {
        return 0.0;
    }

    let volume_score: f64 = landmarks
        .iter()
        .map(|(muscle, lm)| {
            let span = lm.mrv.saturating_sub(lm.mev);
            let sets = tracker.sets(muscle.as_str());
            if span == 0 {
                // Degenerate span: at MRV is fully fatigued
                if sets >= lm.mrv { 1.0 } else { 0.0 }
            } else {
                ((sets as f64 - lm.mev as f64) / span as f64).clamp(0.0, 1.0)
            }
        })
        .sum::<f64>()
        / landmarks.len() as f64;

    let mrv_penalty = (tracker.consecutive_mrv_weeks() as f64 * 0.2).min(0.4);
    let recovery_penalty = recovery_pressure(tracker, landmarks) * 0.3;

    (volume_score + mrv_penalty + recovery_penalty).min(1.0)
}

// ---------------------------------------------------------------------------
/// Deload Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeloadKind {
    /// Flat 50%-of-MEV reduction
    Fallback,
    Light,
    Standard,
    Deep,
}

impl fmt::Display for DeloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fallback => write!(f, "fallback"),
            Self::Light => write!(f, "light"),
            Self::Standard => write!(f, "standard"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeloadPlan {
    pub kind: DeloadKind,
    /// Deload sets as a fraction of MEV
    pub volume_fraction: f64,
    /// Working loads as a fraction of normal
    pub load_reduction: f64,
    pub duration_weeks: u32,
    pub target_sets: BTreeMap<MuscleGroupId, u32>,
    /// Reset the MRV streak and recovery counters when the plan is applied
    pub clears_fatigue_counters: bool,
    pub fatigue_level: Option<f64>,
    pub volume_pressure: Option<f64>,
    pub recommendation: String,
}

/// Computes a muscle-specific deload. Returning `None` hands the decision
/// back to the built-in 50%-of-MEV plan.
pub trait DeloadStrategyResolver: Send + Sync {
    fn resolve(&self, tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> Option<DeloadPlan>;
}

/// Every muscle to round(0.5 * MEV), loads at 50%
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfMevDeload;

impl HalfMevDeload {
    pub fn plan(&self, landmarks: &LandmarkStore) -> DeloadPlan {
        let target_sets = landmarks
            .iter()
            .map(|(muscle, lm)| (muscle.clone(), (lm.mev as f64 * 0.5).round() as u32))
            .collect();

        DeloadPlan {
            kind: DeloadKind::Fallback,
            volume_fraction: 0.5,
            load_reduction: 0.5,
            duration_weeks: 1,
            target_sets,
            clears_fatigue_counters: false,
            fatigue_level: None,
            volume_pressure: None,
            recommendation: "Deload: all muscles at 50% of MEV with 50% working loads.".to_string(),
        }
    }
}

impl DeloadStrategyResolver for HalfMevDeload {
    fn resolve(&self, _tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> Option<DeloadPlan> {
        Some(self.plan(landmarks))
    }
}

/// Picks a light/standard/deep deload from overall fatigue and volume pressure
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptiveDeloadStrategy;

impl DeloadStrategyResolver for AdaptiveDeloadStrategy {
    fn resolve(&self, tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> Option<DeloadPlan> {
        if landmarks.is_empty() {
            return None;
        }

        let fatigue = overall_fatigue(tracker, landmarks);
        let pressure = volume_pressure(tracker, landmarks);

        let (kind, volume_fraction, load_reduction) = if fatigue >= 0.7 || pressure >= 0.8 {
            (DeloadKind::Deep, 0.4, 0.6)
        } else if fatigue >= 0.5 || pressure >= 0.6 {
            (DeloadKind::Standard, 0.5, 0.7)
        } else {
            (DeloadKind::Light, 0.7, 0.8)
        };

        // Long training histories get a second deep deload week
        let duration_weeks = if kind == DeloadKind::Deep && tracker.block_no() > 20 { 2 } else { 1 };

        let target_sets = landmarks
            .iter()
            .map(|(muscle, lm)| {
                let sets = (lm.mev as f64 * volume_fraction).round() as u32;
                (muscle.clone(), sets.max(1))
            })
            .collect();

        let fatigue_pct = (fatigue * 100.0).round();
        let pressure_pct = (pressure * 100.0).round();
        let recommendation = match kind {
            DeloadKind::Deep => format!(
                "Deep deload recommended due to high fatigue ({}%) and volume pressure ({}%). Focus on recovery and technique work.",
                fatigue_pct, pressure_pct
            ),
            DeloadKind::Standard => format!(
                "Standard deload recommended with moderate fatigue ({}%) and volume pressure ({}%). Maintain movement patterns with reduced intensity.",
                fatigue_pct, pressure_pct
            ),
            _ => format!(
                "Light deload recommended with manageable fatigue ({}%) and volume pressure ({}%). Brief recovery before resuming progression.",
                fatigue_pct, pressure_pct
            ),
        };

        Some(DeloadPlan {
            kind,
            volume_fraction,
            load_reduction,
            duration_weeks,
            target_sets,
            clears_fatigue_counters: true,
            fatigue_level: Some(fatigue),
            volume_pressure: Some(pressure),
            recommendation,
        })
    }
}

// ---------------------------------------------------------------------------
/// Deload Assessment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeloadReason {
    /// Two or more consecutive weeks at MRV
    ConsecutiveMrvWeeks,
    /// At least half the muscles need recovery
    RecoveryMajority,
    /// A major muscle is at MRV while fatigue is being reported
    FatigueConfirmedMrv,
    /// The week reached the adaptive mesocycle length
    MesocycleComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeloadAssessment {
    pub should_deload: bool,
    pub reasons: Vec<DeloadReason>,
    pub mrv_breaches: Vec<MuscleGroupId>,
    pub consecutive_mrv_weeks: u32,
    pub current_week: u32,
    pub meso_length: u32,
    pub adaptive_meso_length: u32,
    pub muscles_needing_recovery: u32,
}

// ---------------------------------------------------------------------------
/// Decision Engine
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct DeloadDecisionEngine {
    resolver: Arc<dyn DeloadStrategyResolver>,
    major_muscles: Vec<MuscleGroupId>,
}

impl fmt::Debug for DeloadDecisionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeloadDecisionEngine")
            .field("major_muscles", &self.major_muscles)
            .finish_non_exhaustive()
    }
}

impl DeloadDecisionEngine {
    /// Engine using the 50%-of-MEV plan
    pub fn new(major_muscles: Vec<MuscleGroupId>) -> Self {
        Self::with_resolver(Arc::new(HalfMevDeload), major_muscles)
    }

    pub fn with_resolver(resolver: Arc<dyn DeloadStrategyResolver>, major_muscles: Vec<MuscleGroupId>) -> Self {
        Self {
            resolver,
            major_muscles,
        }
    }

    pub fn major_muscles(&self) -> &[MuscleGroupId] {
        &self.major_muscles
    }

    /// Nominal meso length nudged by MRV approach rate, recovery pressure
    /// and experience, always within [3, 6].
    pub fn adaptive_meso_length(&self, tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> u32 {
        let meso_len = tracker.meso_len();
        let approach_rate = volume_pressure(tracker, landmarks);
        let pressure = recovery_pressure(tracker, landmarks);
        let experience = (tracker.block_no() as f64 / 10.0).min(0.5);

        let adjusted = if approach_rate > 0.6 || pressure > 0.4 {
            meso_len.saturating_sub(1).max(MIN_MESO_LEN)
        } else if approach_rate < 0.3 && pressure < 0.2 {
            (meso_len + (experience * 2.0).floor() as u32).min(MAX_MESO_LEN)
        } else {
            meso_len
        };
        let adaptive = adjusted.clamp(MIN_MESO_LEN, MAX_MESO_LEN);

        debug!(
            meso_len,
            adaptive,
            approach_rate,
            recovery_pressure = pressure,
            "Computed adaptive mesocycle length"
        );
        adaptive
    }

    pub fn assess(&self, tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> DeloadAssessment {
        let muscle_count = landmarks.len() as u32;
        let needing_recovery = tracker.total_muscles_needing_recovery();
        let adaptive_meso_length = self.adaptive_meso_length(tracker, landmarks);

        let mut reasons = Vec::new();

        if tracker.consecutive_mrv_weeks() >= 2 {
            reasons.push(DeloadReason::ConsecutiveMrvWeeks);
        }

        if muscle_count > 0 && needing_recovery >= muscle_count.div_ceil(2) {
            reasons.push(DeloadReason::RecoveryMajority);
        }

        let major_at_mrv = self.major_muscles.iter().any(|muscle| {
            landmarks
                .get(muscle.as_str())
                .map(|lm| tracker.sets(muscle.as_str()) >= lm.mrv)
                .unwrap_or(false)
        });
        if major_at_mrv && needing_recovery > 0 {
            reasons.push(DeloadReason::FatigueConfirmedMrv);
        }

        if tracker.week_no() >= adaptive_meso_length {
            reasons.push(DeloadReason::MesocycleComplete);
        }

        DeloadAssessment {
            should_deload: !reasons.is_empty(),
            reasons,
            mrv_breaches: tracker.mrv_breaches(landmarks),
            consecutive_mrv_weeks: tracker.consecutive_mrv_weeks(),
            current_week: tracker.week_no(),
            meso_length: tracker.meso_len(),
            adaptive_meso_length,
            muscles_needing_recovery: needing_recovery,
        }
    }

    pub fn should_deload(&self, tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> bool {
        self.assess(tracker, landmarks).should_deload
    }

    /// The resolver's plan, or the 50%-of-MEV plan when it declines
    pub fn plan_deload(&self, tracker: &WeeklyVolumeTracker, landmarks: &LandmarkStore) -> DeloadPlan {
        self.resolver
            .resolve(tracker, landmarks)
            .unwrap_or_else(|| HalfMevDeload.plan(landmarks))
    }

    /// Plan and apply a deload to the tracker. Phase flags live on the caller.
    pub fn start_deload(&self, tracker: &mut WeeklyVolumeTracker, landmarks: &LandmarkStore) -> DeloadPlan {
        let plan = self.plan_deload(tracker, landmarks);

        for (muscle, sets) in &plan.target_sets {
            tracker.current_week_sets.insert(muscle.clone(), *sets);
        }
        if plan.clears_fatigue_counters {
            tracker.clear_fatigue_counters();
        }

        info!(
            kind = %plan.kind,
            volume_fraction = plan.volume_fraction,
            load_reduction = plan.load_reduction,
            "Starting deload"
        );
        plan
    }

    /// Every muscle drops to its MV
    pub fn start_resensitization(&self, tracker: &mut WeeklyVolumeTracker, landmarks: &LandmarkStore) {
        tracker.set_all(landmarks, |lm| lm.mv);
        info!(block_no = tracker.block_no(), "Starting resensitization");
    }

    pub fn should_resensitize(&self, tracker: &WeeklyVolumeTracker) -> bool {
        tracker.block_no() % RESENSITIZATION_INTERVAL == 0
    }

    /// Flag a muscle as needing recovery. Returns whether it was at MRV.
    pub fn hit_mrv(
        &self,
        tracker: &mut WeeklyVolumeTracker,
        landmarks: &LandmarkStore,
        muscle: &str,
    ) -> Result<bool, EngineError> {
        let lm = landmarks.get(muscle)?;
        Ok(tracker.flag_recovery_needed(muscle, &lm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuscleCatalog;

    fn setup() -> (DeloadDecisionEngine, WeeklyVolumeTracker, LandmarkStore) {
        let catalog = MuscleCatalog::default();
        let landmarks = LandmarkStore::new(catalog.landmarks()).unwrap();
        let tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        (DeloadDecisionEngine::new(catalog.major_muscles()), tracker, landmarks)
    }

    struct DecliningResolver;

    impl DeloadStrategyResolver for DecliningResolver {
        fn resolve(&self, _: &WeeklyVolumeTracker, _: &LandmarkStore) -> Option<DeloadPlan> {
            None
        }
    }

    #[test]
    fn test_fresh_state_does_not_deload() {
        let (engine, tracker, landmarks) = setup();
        let assessment = engine.assess(&tracker, &landmarks);
        assert!(!assessment.should_deload);
        assert!(assessment.reasons.is_empty());
        assert_eq!(assessment.current_week, 1);
    }

    #[test]
    fn test_consecutive_mrv_weeks_always_triggers() {
        let (engine, mut tracker, landmarks) = setup();
        tracker.consecutive_mrv_weeks = 2;
        let assessment = engine.assess(&tracker, &landmarks);
        assert!(assessment.should_deload);
        assert!(assessment.reasons.contains(&DeloadReason::ConsecutiveMrvWeeks));
    }

    #[test]
    fn test_recovery_majority_triggers() {
        let (engine, mut tracker, landmarks) = setup();
        // ceil(13 / 2) = 7
        tracker.total_muscles_needing_recovery = 6;
        assert!(!engine
            .assess(&tracker, &landmarks)
            .reasons
            .contains(&DeloadReason::RecoveryMajority));
        tracker.total_muscles_needing_recovery = 7;
        assert!(engine
            .assess(&tracker, &landmarks)
            .reasons
            .contains(&DeloadReason::RecoveryMajority));
    }

    #[test]
    fn test_major_muscle_at_mrv_needs_fatigue_confirmation() {
        let (engine, mut tracker, landmarks) = setup();
        tracker.set_weekly_sets(&landmarks, "Chest", 22).unwrap();
        assert!(!engine.should_deload(&tracker, &landmarks));

        engine.hit_mrv(&mut tracker, &landmarks, "Biceps").unwrap();
        let assessment = engine.assess(&tracker, &landmarks);
        assert!(assessment.reasons.contains(&DeloadReason::FatigueConfirmedMrv));
        assert_eq!(assessment.mrv_breaches, vec![MuscleGroupId::from("Chest")]);
    }

    #[test]
    fn test_minor_muscle_at_mrv_is_not_fatigue_confirmed() {
        let (engine, mut tracker, landmarks) = setup();
        tracker.set_weekly_sets(&landmarks, "Biceps", 20).unwrap();
        engine.hit_mrv(&mut tracker, &landmarks, "Neck").unwrap();
        assert!(!engine
            .assess(&tracker, &landmarks)
            .reasons
            .contains(&DeloadReason::FatigueConfirmedMrv));
    }

    #[test]
    fn test_end_of_adaptive_meso_triggers() {
        let (engine, mut tracker, landmarks) = setup();
        // Block 1: experience floor(0.1 * 2) = 0, so adaptive stays at 4
        assert_eq!(engine.adaptive_meso_length(&tracker, &landmarks), 4);
        tracker.week_no = 4;
        let assessment = engine.assess(&tracker, &landmarks);
        assert_eq!(assessment.reasons, vec![DeloadReason::MesocycleComplete]);
    }

    #[test]
    fn test_adaptive_meso_length_shortens_under_pressure() {
        let (engine, mut tracker, landmarks) = setup();
        tracker.set_all(&landmarks, |lm| lm.mrv);
        assert_eq!(engine.adaptive_meso_length(&tracker, &landmarks), 3);

        tracker.set_meso_len(3);
        assert_eq!(engine.adaptive_meso_length(&tracker, &landmarks), 3);
    }

    #[test]
    fn test_adaptive_meso_length_extends_with_experience() {
        let (engine, mut tracker, landmarks) = setup();
        tracker.block_no = 5;
        // experience 0.5 -> +1 week
        assert_eq!(engine.adaptive_meso_length(&tracker, &landmarks), 5);

        tracker.set_meso_len(6);
        assert_eq!(engine.adaptive_meso_length(&tracker, &landmarks), 6);

        tracker.set_meso_len(1);
        assert_eq!(engine.adaptive_meso_length(&tracker, &landmarks), 3);
    }

    #[test]
    fn test_default_deload_is_half_mev() {
        let (engine, mut tracker, landmarks) = setup();
        tracker.consecutive_mrv_weeks = 1;
        let plan = engine.start_deload(&mut tracker, &landmarks);

        assert_eq!(plan.kind, DeloadKind::Fallback);
        assert_eq!(tracker.sets("Chest"), 3);
        assert_eq!(tracker.sets("Back"), 5);
        // round(0.5 * 2) = 1
        assert_eq!(tracker.sets("Glutes"), 1);
        assert_eq!(tracker.consecutive_mrv_weeks(), 1);
    }

    #[test]
    fn test_declining_resolver_falls_back() {
        let catalog = MuscleCatalog::default();
        let landmarks = LandmarkStore::new(catalog.landmarks()).unwrap();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        let engine = DeloadDecisionEngine::with_resolver(Arc::new(DecliningResolver), catalog.major_muscles());

        let plan = engine.start_deload(&mut tracker, &landmarks);
        assert_eq!(plan.kind, DeloadKind::Fallback);
        assert_eq!(tracker.sets("Quads"), 5);
    }

    #[test]
    fn test_adaptive_strategy_levels() {
        let catalog = MuscleCatalog::default();
        let landmarks = LandmarkStore::new(catalog.landmarks()).unwrap();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        let strategy = AdaptiveDeloadStrategy;

        // Everything at MEV: no fatigue, no pressure
        let plan = strategy.resolve(&tracker, &landmarks).unwrap();
        assert_eq!(plan.kind, DeloadKind::Light);
        assert_eq!(plan.target_sets[&MuscleGroupId::from("Chest")], 4);
        assert_eq!(plan.target_sets[&MuscleGroupId::from("Glutes")], 1);

        // Everything at MRV: deep
        tracker.set_all(&landmarks, |lm| lm.mrv);
        let plan = strategy.resolve(&tracker, &landmarks).unwrap();
        assert_eq!(plan.kind, DeloadKind::Deep);
        assert_eq!(plan.duration_weeks, 1);
        assert!(plan.recommendation.starts_with("Deep deload"));

        tracker.block_no = 21;
        assert_eq!(strategy.resolve(&tracker, &landmarks).unwrap().duration_weeks, 2);
    }

    #[test]
    fn test_adaptive_strategy_clears_counters() {
        let catalog = MuscleCatalog::default();
        let landmarks = LandmarkStore::new(catalog.landmarks()).unwrap();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        let engine = DeloadDecisionEngine::with_resolver(Arc::new(AdaptiveDeloadStrategy), catalog.major_muscles());
        tracker.consecutive_mrv_weeks = 2;
        tracker.total_muscles_needing_recovery = 3;

        let plan = engine.start_deload(&mut tracker, &landmarks);
        assert!(plan.clears_fatigue_counters);
        assert_eq!(tracker.consecutive_mrv_weeks(), 0);
        assert_eq!(tracker.total_muscles_needing_recovery(), 0);
    }

    #[test]
    fn test_resensitization() {
        let (engine, mut tracker, landmarks) = setup();
        assert!(!engine.should_resensitize(&tracker));
        tracker.block_no = 4;
        assert!(engine.should_resensitize(&tracker));

        engine.start_resensitization(&mut tracker, &landmarks);
        assert_eq!(tracker.sets("Chest"), 4);
        assert_eq!(tracker.sets("Glutes"), 0);
    }

    #[test]
    fn test_empty_catalog_never_trips_recovery_rules() {
        let landmarks = LandmarkStore::new(BTreeMap::new()).unwrap();
        let tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        let engine = DeloadDecisionEngine::new(Vec::new());
        let assessment = engine.assess(&tracker, &landmarks);
        assert!(!assessment.reasons.contains(&DeloadReason::RecoveryMajority));
        assert_eq!(overall_fatigue(&tracker, &landmarks), 0.0);
    }
}
