//! Weekly Volume Tracking
//!
//! Current/last week set counts per muscle plus the week, meso and block
//! counters and the weekly fatigue counters the deload engine reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::EngineError;
use crate::landmarks::LandmarkStore;
use crate::models::{MuscleGroupId, VolumeLandmarks};

// ---------------------------------------------------------------------------
/// Volume Status: which landmark zone a set count falls in
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeStatus {
    /// Below MV
    UnderMinimum,
    /// MV..MEV
    Maintenance,
    /// MEV..MAV
    Optimal,
    /// MAV..MRV
    High,
    /// At or beyond MRV
    Maximum,
}

impl std::fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnderMinimum => write!(f, "under-minimum"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Optimal => write!(f, "optimal"),
            Self::High => write!(f, "high"),
            Self::Maximum => write!(f, "maximum"),
        }
    }
}

/// Zones are half-open on their lower bound: a count equal to a landmark
/// belongs to the zone above it.
pub fn classify(sets: u32, landmarks: &VolumeLandmarks) -> VolumeStatus {
    if sets < landmarks.mv {
        VolumeStatus::UnderMinimum
    } else if sets < landmarks.mev {
        VolumeStatus::Maintenance
    } else if sets < landmarks.mav {
        VolumeStatus::Optimal
    } else if sets < landmarks.mrv {
        VolumeStatus::High
    } else {
        VolumeStatus::Maximum
    }
}

fn clamp_sets(sets: i64) -> u32 {
    sets.clamp(0, u32::MAX as i64) as u32
}

// ---------------------------------------------------------------------------
/// Week Rollover Result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekRollover {
    /// Muscles that finished the week at or above MRV
    pub mrv_breaches: Vec<MuscleGroupId>,
    pub week_no: u32,
    pub block_no: u32,
    /// The rollover wrapped past the end of the mesocycle
    pub block_completed: bool,
}

// ---------------------------------------------------------------------------
/// Weekly Volume Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVolumeTracker {
    pub(crate) current_week_sets: BTreeMap<MuscleGroupId, u32>,
    pub(crate) last_week_sets: BTreeMap<MuscleGroupId, u32>,
    pub(crate) week_no: u32,
    pub(crate) meso_len: u32,
    pub(crate) block_no: u32,
    pub(crate) consecutive_mrv_weeks: u32,
    pub(crate) recovery_sessions_this_week: u32,
    pub(crate) total_muscles_needing_recovery: u32,
}

impl WeeklyVolumeTracker {
    /// Fresh tracker at week 1 of block 1 with every muscle at its MEV,
    /// this week and last
    pub fn seeded(landmarks: &LandmarkStore, meso_len: u32) -> Self {
        let current_week_sets: BTreeMap<_, _> = landmarks
            .iter()
            .map(|(muscle, lm)| (muscle.clone(), lm.mev))
            .collect();

        Self {
            last_week_sets: current_week_sets.clone(),
            current_week_sets,
            week_no: 1,
            meso_len: meso_len.max(1),
            block_no: 1,
            consecutive_mrv_weeks: 0,
            recovery_sessions_this_week: 0,
            total_muscles_needing_recovery: 0,
        }
    }

    pub fn week_no(&self) -> u32 {
        self.week_no
    }

    pub fn meso_len(&self) -> u32 {
        self.meso_len
    }

    pub fn block_no(&self) -> u32 {
        self.block_no
    }

    pub fn consecutive_mrv_weeks(&self) -> u32 {
        self.consecutive_mrv_weeks
    }

    pub fn recovery_sessions_this_week(&self) -> u32 {
        self.recovery_sessions_this_week
    }

    pub fn total_muscles_needing_recovery(&self) -> u32 {
        self.total_muscles_needing_recovery
    }

    pub fn current_week_sets(&self) -> &BTreeMap<MuscleGroupId, u32> {
        &self.current_week_sets
    }

    pub fn last_week_sets(&self) -> &BTreeMap<MuscleGroupId, u32> {
        &self.last_week_sets
    }

    /// Current sets for a muscle, 0 when nothing is recorded
    pub fn sets(&self, muscle: &str) -> u32 {
        self.current_week_sets.get(muscle).copied().unwrap_or(0)
    }

    pub fn last_week(&self, muscle: &str) -> Option<u32> {
        self.last_week_sets.get(muscle).copied()
    }

    /// Store `sets` clamped to >= 0
    pub fn set_weekly_sets(
        &mut self,
        landmarks: &LandmarkStore,
        muscle: &str,
        sets: i64,
    ) -> Result<u32, EngineError> {
        if !landmarks.contains(muscle) {
            return Err(EngineError::UnknownMuscleGroup(muscle.to_string()));
        }
        let stored = clamp_sets(sets);
        self.current_week_sets.insert(MuscleGroupId::from(muscle), stored);
        Ok(stored)
    }

    /// Add `delta` (may be negative), then clamp to >= 0
    pub fn add_sets(
        &mut self,
        landmarks: &LandmarkStore,
        muscle: &str,
        delta: i64,
    ) -> Result<u32, EngineError> {
        let current = self.sets(muscle) as i64;
        self.set_weekly_sets(landmarks, muscle, current.saturating_add(delta))
    }

    /// Overwrite every muscle's sets with `target(landmarks)`
    pub fn set_all(&mut self, landmarks: &LandmarkStore, target: impl Fn(&VolumeLandmarks) -> u32) {
        for (muscle, lm) in landmarks.iter() {
            self.current_week_sets.insert(muscle.clone(), target(lm));
        }
    }

    pub fn reset_to_mev(&mut self, landmarks: &LandmarkStore) {
        self.set_all(landmarks, |lm| lm.mev);
    }

    /// Muscles whose current sets are at or above MRV
    pub fn mrv_breaches(&self, landmarks: &LandmarkStore) -> Vec<MuscleGroupId> {
        landmarks
            .iter()
            .filter(|(muscle, lm)| self.sets(muscle.as_str()) >= lm.mrv)
            .map(|(muscle, _)| muscle.clone())
            .collect()
    }

    /// Close out the week.
    ///
    /// The MRV streak grows when any muscle finished at/above MRV and resets
    /// otherwise; the weekly recovery counters always reset. Passing the end
    /// of the mesocycle wraps to week 1 of the next block and clears the streak.
    pub fn roll_week(&mut self, landmarks: &LandmarkStore) -> WeekRollover {
        self.last_week_sets = self.current_week_sets.clone();

        let mrv_breaches = self.mrv_breaches(landmarks);
        if mrv_breaches.is_empty() {
            self.consecutive_mrv_weeks = 0;
        } else {
            self.consecutive_mrv_weeks += 1;
        }

        self.week_no += 1;

        let block_completed = self.week_no > self.meso_len;
        if block_completed {
            self.week_no = 1;
            self.block_no += 1;
            self.consecutive_mrv_weeks = 0;
            info!(block_no = self.block_no, "Mesocycle complete, starting next block");
        }

        self.recovery_sessions_this_week = 0;
        self.total_muscles_needing_recovery = 0;

        debug!(
            week_no = self.week_no,
            block_no = self.block_no,
            breaches = mrv_breaches.len(),
            consecutive_mrv_weeks = self.consecutive_mrv_weeks,
            "Rolled week"
        );

        WeekRollover {
            mrv_breaches,
            week_no: self.week_no,
            block_no: self.block_no,
            block_completed,
        }
    }

    /// Shrinking below the current week moves the tracker to the new last week.
    pub fn set_meso_len(&mut self, weeks: u32) {
        self.meso_len = weeks.max(1);
        if self.week_no > self.meso_len {
            debug!(week_no = self.week_no, meso_len = self.meso_len, "Week moved to end of shortened mesocycle");
            self.week_no = self.meso_len;
        }
    }

    /// A muscle was flagged as needing recovery. Returns true when it was
    /// already at/above MRV, which also escalates the MRV streak.
    pub fn flag_recovery_needed(&mut self, muscle: &str, landmarks: &VolumeLandmarks) -> bool {
        self.total_muscles_needing_recovery += 1;
        let at_mrv = self.sets(muscle) >= landmarks.mrv;
        if at_mrv {
            self.consecutive_mrv_weeks += 1;
        }
        at_mrv
    }

    pub fn record_recovery_session(&mut self) {
        self.recovery_sessions_this_week += 1;
    }

    pub fn clear_fatigue_counters(&mut self) {
        self.consecutive_mrv_weeks = 0;
        self.recovery_sessions_this_week = 0;
        self.total_muscles_needing_recovery = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuscleCatalog;

    fn store() -> LandmarkStore {
        LandmarkStore::new(MuscleCatalog::default().landmarks()).unwrap()
    }

    #[test]
    fn test_classify_half_open_boundaries() {
        let lm = VolumeLandmarks::new(4, 8, 16, 22);
        assert_eq!(classify(3, &lm), VolumeStatus::UnderMinimum);
        assert_eq!(classify(4, &lm), VolumeStatus::Maintenance);
        assert_eq!(classify(7, &lm), VolumeStatus::Maintenance);
        assert_eq!(classify(8, &lm), VolumeStatus::Optimal);
        assert_eq!(classify(16, &lm), VolumeStatus::High);
        assert_eq!(classify(21, &lm), VolumeStatus::High);
        assert_eq!(classify(22, &lm), VolumeStatus::Maximum);
        assert_eq!(classify(40, &lm), VolumeStatus::Maximum);
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&VolumeStatus::UnderMinimum).unwrap(),
            "\"under-minimum\""
        );
        assert_eq!(VolumeStatus::Maximum.to_string(), "maximum");
    }

    #[test]
    fn test_seeded_at_mev() {
        let landmarks = store();
        let tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        assert_eq!(tracker.week_no(), 1);
        assert_eq!(tracker.block_no(), 1);
        assert_eq!(tracker.sets("Chest"), 6);
        assert_eq!(tracker.sets("Back"), 10);
        assert_eq!(tracker.last_week("Back"), Some(10));
        assert_eq!(tracker.current_week_sets().len(), 13);
    }

    #[test]
    fn test_set_and_add_clamp_to_zero() {
        let landmarks = store();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);

        assert_eq!(tracker.set_weekly_sets(&landmarks, "Chest", -5).unwrap(), 0);
        assert_eq!(tracker.add_sets(&landmarks, "Chest", 3).unwrap(), 3);
        assert_eq!(tracker.add_sets(&landmarks, "Chest", -10).unwrap(), 0);

        let err = tracker.set_weekly_sets(&landmarks, "Wings", 4).unwrap_err();
        assert_eq!(err, EngineError::UnknownMuscleGroup("Wings".to_string()));
    }

    #[test]
    fn test_roll_week_wraps_after_meso() {
        let landmarks = store();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        tracker.set_weekly_sets(&landmarks, "Chest", 30).unwrap();

        for _ in 0..3 {
            let rollover = tracker.roll_week(&landmarks);
            assert!(!rollover.block_completed);
        }
        assert_eq!(tracker.week_no(), 4);
        assert_eq!(tracker.consecutive_mrv_weeks(), 3);

        let rollover = tracker.roll_week(&landmarks);
        assert!(rollover.block_completed);
        assert_eq!(tracker.week_no(), 1);
        assert_eq!(tracker.block_no(), 2);
        assert_eq!(tracker.consecutive_mrv_weeks(), 0);
    }

    #[test]
    fn test_roll_week_tracks_streak_and_resets_weekly_counters() {
        let landmarks = store();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 6);
        tracker.set_weekly_sets(&landmarks, "Quads", 20).unwrap();
        tracker.record_recovery_session();
        tracker.flag_recovery_needed("Biceps", &landmarks.get("Biceps").unwrap());

        let rollover = tracker.roll_week(&landmarks);
        assert_eq!(rollover.mrv_breaches, vec![MuscleGroupId::from("Quads")]);
        assert_eq!(tracker.consecutive_mrv_weeks(), 1);
        assert_eq!(tracker.recovery_sessions_this_week(), 0);
        assert_eq!(tracker.total_muscles_needing_recovery(), 0);
        assert_eq!(tracker.last_week("Quads"), Some(20));

        // A clean week breaks the streak
        tracker.reset_to_mev(&landmarks);
        tracker.roll_week(&landmarks);
        assert_eq!(tracker.consecutive_mrv_weeks(), 0);
    }

    #[test]
    fn test_flag_recovery_escalates_only_at_mrv() {
        let landmarks = store();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        let chest = landmarks.get("Chest").unwrap();

        assert!(!tracker.flag_recovery_needed("Chest", &chest));
        assert_eq!(tracker.total_muscles_needing_recovery(), 1);
        assert_eq!(tracker.consecutive_mrv_weeks(), 0);

        tracker.set_weekly_sets(&landmarks, "Chest", 22).unwrap();
        assert!(tracker.flag_recovery_needed("Chest", &chest));
        assert_eq!(tracker.total_muscles_needing_recovery(), 2);
        assert_eq!(tracker.consecutive_mrv_weeks(), 1);
    }

    #[test]
    fn test_meso_len_never_below_one() {
        let landmarks = store();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 0);
        assert_eq!(tracker.meso_len(), 1);
        tracker.set_meso_len(5);
        assert_eq!(tracker.meso_len(), 5);
    }

    #[test]
    fn test_shorter_meso_pulls_week_back() {
        let landmarks = store();
        let mut tracker = WeeklyVolumeTracker::seeded(&landmarks, 4);
        tracker.roll_week(&landmarks);
        tracker.roll_week(&landmarks);
        assert_eq!(tracker.week_no(), 3);

        tracker.set_meso_len(2);
        assert_eq!(tracker.week_no(), 2);

        let rollover = tracker.roll_week(&landmarks);
        assert!(rollover.block_completed);
        assert_eq!(tracker.week_no(), 1);
    }
}
