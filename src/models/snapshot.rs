use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::landmarks::{DietPhase, MuscleGroupId, VolumeLandmarks};

/// Persisted engine record, stored as JSON under a single key.
///
/// Every field is optional on read; `PeriodizationState::from_snapshot`
/// merges whatever is present onto a freshly seeded state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateSnapshot {
  pub volume_landmarks: BTreeMap<MuscleGroupId, VolumeLandmarks>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub original_landmarks: BTreeMap<MuscleGroupId, VolumeLandmarks>,
  pub week_no: Option<u32>,
  pub meso_len: Option<u32>,
  pub block_no: Option<u32>,
  pub deload_phase: Option<bool>,
  pub resensitization_phase: Option<bool>,
  pub diet_phase: Option<DietPhase>,
  pub load_reduction: Option<f64>,
  pub current_week_sets: BTreeMap<MuscleGroupId, u32>,
  pub last_week_sets: BTreeMap<MuscleGroupId, u32>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub baseline_strength: BTreeMap<MuscleGroupId, f64>,
  #[serde(rename = "consecutiveMRVWeeks")]
  pub consecutive_mrv_weeks: Option<u32>,
  pub recovery_sessions_this_week: Option<u32>,
  pub total_muscles_needing_recovery: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
  Accumulation,
  Deload,
  Resensitization,
}

impl std::fmt::Display for TrainingPhase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Accumulation => write!(f, "accumulation"),
      Self::Deload => write!(f, "deload"),
      Self::Resensitization => write!(f, "resensitization"),
    }
  }
}

/// Read-only view consumed by dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
  pub week: u32,
  pub meso: u32,
  pub block: u32,
  #[serde(rename = "targetRIR")]
  pub target_rir: f64,
  pub deload_recommended: bool,
  pub resensitization_recommended: bool,
  pub current_phase: TrainingPhase,
}
