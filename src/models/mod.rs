pub mod landmarks;
pub mod snapshot;

pub use landmarks::{DietPhase, LandmarkPatch, MuscleGroupId, VolumeLandmarks};
pub use snapshot::{StateSnapshot, StateSummary, TrainingPhase};
