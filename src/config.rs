//! Engine configuration
//!
//! Environment-driven (optionally seeded from a `.env` file). The muscle
//! catalog is data, not code: it can be replaced wholesale by a JSON file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::EngineError;
use crate::models::{MuscleGroupId, VolumeLandmarks};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DATA_DIR_VAR: &str = "PERIODIZATION_DATA_DIR";
const DATABASE_URL_VAR: &str = "PERIODIZATION_DATABASE_URL";
const MESO_LEN_VAR: &str = "PERIODIZATION_MESO_LEN";
const MUSCLES_FILE_VAR: &str = "PERIODIZATION_MUSCLES_FILE";

const DB_FILE_NAME: &str = "periodization.db";
pub const DEFAULT_MESO_LEN: u32 = 4;

/// ---------------------------------------------------------------------------
/// Muscle Catalog
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleDefinition {
  pub name: MuscleGroupId,
  pub landmarks: VolumeLandmarks,
  /// Major muscles participate in the fatigue-confirmed MRV deload trigger
  #[serde(default)]
  pub major: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MuscleCatalog {
  pub muscles: Vec<MuscleDefinition>,
}

impl Default for MuscleCatalog {
  fn default() -> Self {
    let table: [(&str, VolumeLandmarks, bool); 13] = [
      ("Chest", VolumeLandmarks::new(4, 6, 16, 22), true),
      ("Back", VolumeLandmarks::new(6, 10, 20, 25), true),
      ("Quads", VolumeLandmarks::new(6, 10, 16, 20), true),
      ("Glutes", VolumeLandmarks::new(0, 2, 12, 25), false),
      ("Hamstrings", VolumeLandmarks::new(4, 6, 16, 20), false),
      ("Shoulders", VolumeLandmarks::new(4, 8, 16, 20), true),
      ("Biceps", VolumeLandmarks::new(4, 6, 14, 20), false),
      ("Triceps", VolumeLandmarks::new(4, 6, 14, 18), false),
      ("Calves", VolumeLandmarks::new(6, 8, 16, 22), false),
      ("Abs", VolumeLandmarks::new(0, 6, 16, 25), false),
      ("Forearms", VolumeLandmarks::new(2, 4, 10, 16), false),
      ("Neck", VolumeLandmarks::new(0, 2, 8, 12), false),
      ("Traps", VolumeLandmarks::new(2, 4, 12, 16), false),
    ];

    Self {
      muscles: table
        .into_iter()
        .map(|(name, landmarks, major)| MuscleDefinition {
          name: name.into(),
          landmarks,
          major,
        })
        .collect(),
    }
  }
}

impl MuscleCatalog {
  pub fn from_json(json: &str) -> Result<Self, EngineError> {
    let catalog: Self = serde_json::from_str(json)
      .map_err(|e| EngineError::Config(format!("Failed to parse muscle catalog: {}", e)))?;
    catalog.validate()?;
    Ok(catalog)
  }

  /// Names must be non-empty and unique; every entry must be ordered
  pub fn validate(&self) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for def in &self.muscles {
      if def.name.as_str().trim().is_empty() {
        return Err(EngineError::Config("Muscle name cannot be empty".into()));
      }
      if !seen.insert(def.name.as_str()) {
        return Err(EngineError::Config(format!(
          "Duplicate muscle in catalog: {}",
          def.name
        )));
      }
      if !def.landmarks.is_ordered() {
        return Err(EngineError::InvalidLandmarkOrdering {
          muscle: def.name.to_string(),
          landmarks: def.landmarks,
        });
      }
    }
    Ok(())
  }

  pub fn landmarks(&self) -> BTreeMap<MuscleGroupId, VolumeLandmarks> {
    self
      .muscles
      .iter()
      .map(|def| (def.name.clone(), def.landmarks))
      .collect()
  }

  pub fn major_muscles(&self) -> Vec<MuscleGroupId> {
    self
      .muscles
      .iter()
      .filter(|def| def.major)
      .map(|def| def.name.clone())
      .collect()
  }
}

/// ---------------------------------------------------------------------------
/// Engine Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineConfig {
  pub database_url: String,
  pub meso_len: u32,
  pub catalog: MuscleCatalog,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      database_url: sqlite_url_for(&PathBuf::from(".")),
      meso_len: DEFAULT_MESO_LEN,
      catalog: MuscleCatalog::default(),
    }
  }
}

impl EngineConfig {
  pub fn from_env() -> Result<Self, EngineError> {
    dotenvy::dotenv().ok();

    let data_dir = env::var(DATA_DIR_VAR)
      .map(PathBuf::from)
      .unwrap_or_else(|_| PathBuf::from("."));
    let database_url = env::var(DATABASE_URL_VAR).unwrap_or_else(|_| sqlite_url_for(&data_dir));

    let meso_len = match env::var(MESO_LEN_VAR) {
      Ok(raw) => parse_meso_len(&raw)?,
      Err(_) => DEFAULT_MESO_LEN,
    };

    let catalog = match env::var(MUSCLES_FILE_VAR) {
      Ok(path) => {
        let json = fs::read_to_string(&path)
          .map_err(|e| EngineError::Config(format!("Failed to read {}: {}", path, e)))?;
        MuscleCatalog::from_json(&json)?
      }
      Err(_) => MuscleCatalog::default(),
    };

    Ok(Self {
      database_url,
      meso_len,
      catalog,
    })
  }
}

fn sqlite_url_for(data_dir: &std::path::Path) -> String {
  format!("sqlite://{}?mode=rwc", data_dir.join(DB_FILE_NAME).display())
}

fn parse_meso_len(raw: &str) -> Result<u32, EngineError> {
  match raw.trim().parse::<u32>() {
    Ok(weeks) if weeks >= 1 => Ok(weeks),
    _ => Err(EngineError::Config(format!(
      "{} must be a whole number of weeks >= 1 (got {:?})",
      MESO_LEN_VAR, raw
    ))),
  }
}
