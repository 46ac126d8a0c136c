pub mod commands;
pub mod config;
pub mod db;
pub mod deload;
pub mod effort;
pub mod error;
pub mod fatigue;
pub mod frequency;
pub mod landmarks;
pub mod models;
pub mod state;
pub mod stimulus;
pub mod storage;
pub mod validation;
pub mod volume;

#[cfg(test)]
mod test_utils;

pub use config::{EngineConfig, MuscleCatalog};
pub use db::AppState;
pub use error::{EngineError, EngineResult};
pub use state::PeriodizationState;
