//! Engine error type
//!
//! Structural failures only. Out-of-range user input is reported through the
//! validation result types instead of `Err`.

use serde::{Deserialize, Serialize};

use crate::models::VolumeLandmarks;

#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "message")]
pub enum EngineError {
  #[error("Unknown muscle group: {0}")]
  UnknownMuscleGroup(String),

  #[error("Invalid landmark ordering for {muscle}: MV {} / MEV {} / MAV {} / MRV {} (need MV <= MEV <= MAV <= MRV)", .landmarks.mv, .landmarks.mev, .landmarks.mav, .landmarks.mrv)]
  InvalidLandmarkOrdering {
    muscle: String,
    landmarks: VolumeLandmarks,
  },

  #[error("Invalid baseline load for {muscle}: {load} (must be a positive, finite number)")]
  InvalidBaselineLoad { muscle: String, load: f64 },

  #[error("Invalid diet phase: {0}")]
  InvalidDietPhase(String),

  #[error("Missing or invalid configuration: {0}")]
  Config(String),

  #[error("Database error: {0}")]
  Database(String),

  #[error("Serialization error: {0}")]
  Serialization(String),
}

impl From<sqlx::Error> for EngineError {
  fn from(e: sqlx::Error) -> Self {
    EngineError::Database(e.to_string())
  }
}

impl From<sqlx::migrate::MigrateError> for EngineError {
  fn from(e: sqlx::migrate::MigrateError) -> Self {
    EngineError::Database(e.to_string())
  }
}

impl From<serde_json::Error> for EngineError {
  fn from(e: serde_json::Error) -> Self {
    EngineError::Serialization(e.to_string())
  }
}

pub type EngineResult<T> = Result<T, EngineError>;
