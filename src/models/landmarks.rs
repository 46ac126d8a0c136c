use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::error::EngineError;

/// Muscle group identifier. The set of muscle groups comes from the catalog,
/// so this is an open string key rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MuscleGroupId(String);

impl MuscleGroupId {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for MuscleGroupId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Borrow<str> for MuscleGroupId {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl From<&str> for MuscleGroupId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

impl From<String> for MuscleGroupId {
  fn from(s: String) -> Self {
    Self(s)
  }
}

/// Weekly set-count landmarks for one muscle group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeLandmarks {
  /// Maintenance Volume
  #[serde(rename = "MV")]
  pub mv: u32,
  /// Minimum Effective Volume
  #[serde(rename = "MEV")]
  pub mev: u32,
  /// Maximum Adaptive Volume
  #[serde(rename = "MAV")]
  pub mav: u32,
  /// Maximum Recoverable Volume
  #[serde(rename = "MRV")]
  pub mrv: u32,
}

impl VolumeLandmarks {
  pub const fn new(mv: u32, mev: u32, mav: u32, mrv: u32) -> Self {
    Self { mv, mev, mav, mrv }
  }

  /// MV <= MEV <= MAV <= MRV
  pub fn is_ordered(&self) -> bool {
    self.mv <= self.mev && self.mev <= self.mav && self.mav <= self.mrv
  }

  pub fn merged(&self, patch: &LandmarkPatch) -> Self {
    Self {
      mv: patch.mv.unwrap_or(self.mv),
      mev: patch.mev.unwrap_or(self.mev),
      mav: patch.mav.unwrap_or(self.mav),
      mrv: patch.mrv.unwrap_or(self.mrv),
    }
  }
}

/// Partial landmark update. Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkPatch {
  #[serde(rename = "MV", default, skip_serializing_if = "Option::is_none")]
  pub mv: Option<u32>,
  #[serde(rename = "MEV", default, skip_serializing_if = "Option::is_none")]
  pub mev: Option<u32>,
  #[serde(rename = "MAV", default, skip_serializing_if = "Option::is_none")]
  pub mav: Option<u32>,
  #[serde(rename = "MRV", default, skip_serializing_if = "Option::is_none")]
  pub mrv: Option<u32>,
}

impl LandmarkPatch {
  pub fn is_empty(&self) -> bool {
    self.mv.is_none() && self.mev.is_none() && self.mav.is_none() && self.mrv.is_none()
  }
}

// ---------------------------------------------------------------------------
/// Diet Phase: scales landmarks away from their originals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DietPhase {
  Bulk,
  Cut,
  #[default]
  Maintenance,
}

impl fmt::Display for DietPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bulk => write!(f, "bulk"),
      Self::Cut => write!(f, "cut"),
      Self::Maintenance => write!(f, "maintenance"),
    }
  }
}

impl std::str::FromStr for DietPhase {
  type Err = EngineError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "bulk" => Ok(Self::Bulk),
      "cut" => Ok(Self::Cut),
      "maintenance" => Ok(Self::Maintenance),
      _ => Err(EngineError::InvalidDietPhase(s.to_string())),
    }
  }
}
