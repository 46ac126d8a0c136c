//! Volume landmark store
//!
//! Owns the per-muscle MV/MEV/MAV/MRV table and the untouched originals it
//! was created from. Every write path leaves `MV <= MEV <= MAV <= MRV` intact:
//! explicit updates are validated and rejected whole, diet rescaling is
//! ordered by construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::EngineError;
use crate::models::{DietPhase, LandmarkPatch, MuscleGroupId, VolumeLandmarks};

/// Share of the MEV..MRV span where MAV sits after a diet adjustment
const MAV_SPAN_FRACTION: f64 = 0.7;

const BULK_MEV_FACTOR: f64 = 0.8;
const CUT_MEV_FACTOR: f64 = 1.2;
const CUT_MRV_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkStore {
    current: BTreeMap<MuscleGroupId, VolumeLandmarks>,
    original: BTreeMap<MuscleGroupId, VolumeLandmarks>,
}

impl LandmarkStore {
    /// Build a store whose originals are a copy of `landmarks`
    pub fn new(landmarks: BTreeMap<MuscleGroupId, VolumeLandmarks>) -> Result<Self, EngineError> {
        let original = landmarks.clone();
        Self::from_parts(landmarks, original)
    }

    /// Build a store from separately persisted current and original tables.
    /// Muscles missing from `original` use their current landmarks.
    pub fn from_parts(
        current: BTreeMap<MuscleGroupId, VolumeLandmarks>,
        mut original: BTreeMap<MuscleGroupId, VolumeLandmarks>,
    ) -> Result<Self, EngineError> {
        for (muscle, landmarks) in current.iter().chain(original.iter()) {
            ensure_ordered(muscle.as_str(), landmarks)?;
        }
        original.retain(|muscle, _| current.contains_key(muscle));
        for (muscle, landmarks) in &current {
            original.entry(muscle.clone()).or_insert(*landmarks);
        }
        Ok(Self { current, original })
    }

    pub fn get(&self, muscle: &str) -> Result<VolumeLandmarks, EngineError> {
        self.current
            .get(muscle)
            .copied()
            .ok_or_else(|| EngineError::UnknownMuscleGroup(muscle.to_string()))
    }

    pub fn original(&self, muscle: &str) -> Result<VolumeLandmarks, EngineError> {
        self.original
            .get(muscle)
            .copied()
            .ok_or_else(|| EngineError::UnknownMuscleGroup(muscle.to_string()))
    }

    pub fn contains(&self, muscle: &str) -> bool {
        self.current.contains_key(muscle)
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn muscles(&self) -> impl Iterator<Item = &MuscleGroupId> {
        self.current.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MuscleGroupId, &VolumeLandmarks)> {
        self.current.iter()
    }

    pub fn current_table(&self) -> &BTreeMap<MuscleGroupId, VolumeLandmarks> {
        &self.current
    }

    pub fn original_table(&self) -> &BTreeMap<MuscleGroupId, VolumeLandmarks> {
        &self.original
    }

    /// Merge `patch` into the muscle's landmarks. An ordering violation
    /// rejects the whole patch and leaves the stored value untouched.
    pub fn update(&mut self, muscle: &str, patch: &LandmarkPatch) -> Result<VolumeLandmarks, EngineError> {
        let merged = self.get(muscle)?.merged(patch);
        ensure_ordered(muscle, &merged)?;

        if let Some(slot) = self.current.get_mut(muscle) {
            *slot = merged;
        }
        Ok(merged)
    }

    /// Re-derive every muscle's landmarks from its original for `phase`.
    /// Calling this repeatedly with the same phase yields the same table.
    pub fn apply_diet_phase(&mut self, phase: DietPhase) {
        for (muscle, original) in &self.original {
            let adjusted = diet_adjusted(original, phase);
            debug!(
                muscle = %muscle,
                phase = %phase,
                mev = adjusted.mev,
                mav = adjusted.mav,
                mrv = adjusted.mrv,
                "Adjusted landmarks for diet phase"
            );
            self.current.insert(muscle.clone(), adjusted);
        }
    }
}

fn ensure_ordered(muscle: &str, landmarks: &VolumeLandmarks) -> Result<(), EngineError> {
    if landmarks.is_ordered() {
        Ok(())
    } else {
        Err(EngineError::InvalidLandmarkOrdering {
            muscle: muscle.to_string(),
            landmarks: *landmarks,
        })
    }
}

fn scale(value: u32, factor: f64) -> u32 {
    (value as f64 * factor).round() as u32
}

/// Scale MEV/MRV for the phase, then clamp MEV below MRV (and MV below MEV)
/// and place MAV at 70% of the MEV..MRV span.
pub fn diet_adjusted(original: &VolumeLandmarks, phase: DietPhase) -> VolumeLandmarks {
    let (mut mev, mrv) = match phase {
        DietPhase::Bulk => (scale(original.mev, BULK_MEV_FACTOR), original.mrv),
        DietPhase::Cut => (
            scale(original.mev, CUT_MEV_FACTOR),
            scale(original.mrv, CUT_MRV_FACTOR),
        ),
        DietPhase::Maintenance => (original.mev, original.mrv),
    };

    mev = mev.min(mrv.saturating_sub(1));
    let mv = original.mv.min(mev);
    let mav = (mev as f64 + MAV_SPAN_FRACTION * (mrv - mev) as f64).round() as u32;

    VolumeLandmarks { mv, mev, mav, mrv }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuscleCatalog;

    fn default_store() -> LandmarkStore {
        LandmarkStore::new(MuscleCatalog::default().landmarks()).unwrap()
    }

    #[test]
    fn test_get_unknown_muscle() {
        let store = default_store();
        assert_eq!(
            store.get("Wings"),
            Err(EngineError::UnknownMuscleGroup("Wings".to_string()))
        );
        assert_eq!(store.get("Chest").unwrap(), VolumeLandmarks::new(4, 6, 16, 22));
    }

    #[test]
    fn test_update_merges_fields() {
        let mut store = default_store();
        let patch = LandmarkPatch {
            mrv: Some(24),
            ..Default::default()
        };
        let updated = store.update("Chest", &patch).unwrap();
        assert_eq!(updated, VolumeLandmarks::new(4, 6, 16, 24));
        assert_eq!(store.get("Chest").unwrap().mrv, 24);
        // Originals never move
        assert_eq!(store.original("Chest").unwrap().mrv, 22);
    }

    #[test]
    fn test_update_rejects_invalid_ordering_without_partial_write() {
        let mut store = default_store();
        let patch = LandmarkPatch {
            mev: Some(8),
            mav: Some(30),
            ..Default::default()
        };
        let err = store.update("Chest", &patch).unwrap_err();
        assert!(matches!(err, EngineError::InvalidLandmarkOrdering { .. }));
        assert_eq!(store.get("Chest").unwrap(), VolumeLandmarks::new(4, 6, 16, 22));
    }

    #[test]
    fn test_update_unknown_muscle() {
        let mut store = default_store();
        let err = store.update("Wings", &LandmarkPatch::default()).unwrap_err();
        assert_eq!(err, EngineError::UnknownMuscleGroup("Wings".to_string()));
    }

    #[test]
    fn test_cut_adjustment() {
        let adjusted = diet_adjusted(&VolumeLandmarks::new(4, 8, 16, 22), DietPhase::Cut);
        assert_eq!(adjusted.mev, 10);
        assert_eq!(adjusted.mrv, 18);
        assert_eq!(adjusted.mav, 16);
        assert!(adjusted.mev < adjusted.mrv);
        assert!(adjusted.is_ordered());
    }

    #[test]
    fn test_bulk_adjustment_keeps_mrv() {
        let adjusted = diet_adjusted(&VolumeLandmarks::new(6, 10, 20, 25), DietPhase::Bulk);
        assert_eq!(adjusted.mev, 8);
        assert_eq!(adjusted.mrv, 25);
        // round(8 + 0.7 * 17) = round(19.9)
        assert_eq!(adjusted.mav, 20);
    }

    #[test]
    fn test_adjustment_clamps_degenerate_landmarks() {
        // Cut shrinks MRV below the scaled MEV and below MV
        let adjusted = diet_adjusted(&VolumeLandmarks::new(10, 10, 11, 11), DietPhase::Cut);
        assert!(adjusted.is_ordered());
        assert_eq!(adjusted.mrv, 9);
        assert_eq!(adjusted.mev, 8);
        assert_eq!(adjusted.mv, 8);

        let zero = diet_adjusted(&VolumeLandmarks::new(0, 0, 0, 0), DietPhase::Bulk);
        assert_eq!(zero, VolumeLandmarks::new(0, 0, 0, 0));
    }

    #[test]
    fn test_diet_phase_preserves_invariant_for_catalog() {
        let mut store = default_store();
        for phase in [DietPhase::Bulk, DietPhase::Cut, DietPhase::Maintenance] {
            store.apply_diet_phase(phase);
            for (muscle, landmarks) in store.iter() {
                assert!(landmarks.is_ordered(), "{} violated ordering in {}", muscle, phase);
            }
        }
    }

    #[test]
    fn test_diet_phase_is_idempotent() {
        let mut store = default_store();
        store.apply_diet_phase(DietPhase::Cut);
        let once = store.current_table().clone();
        store.apply_diet_phase(DietPhase::Cut);
        assert_eq!(store.current_table(), &once);
    }

    #[test]
    fn test_maintenance_restores_original_mev_and_mrv() {
        let mut store = default_store();
        store.apply_diet_phase(DietPhase::Cut);
        store.apply_diet_phase(DietPhase::Maintenance);
        let chest = store.get("Chest").unwrap();
        assert_eq!(chest.mev, 6);
        assert_eq!(chest.mrv, 22);
        // MAV is re-placed at 70% of the span: round(6 + 0.7 * 16)
        assert_eq!(chest.mav, 17);
    }

    #[test]
    fn test_from_parts_fills_missing_originals() {
        let mut current = BTreeMap::new();
        current.insert(MuscleGroupId::from("Lats"), VolumeLandmarks::new(4, 8, 16, 20));
        let store = LandmarkStore::from_parts(current, BTreeMap::new()).unwrap();
        assert_eq!(store.original("Lats").unwrap(), VolumeLandmarks::new(4, 8, 16, 20));
    }
}
