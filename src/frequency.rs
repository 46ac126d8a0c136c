//! Training Frequency Advice
//!
//! Per-muscle sessions-per-week recommendations from recovery timing, weekly
//! volume, recovery capacity and training age.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{MuscleGroupId, VolumeLandmarks};
use crate::stimulus::Urgency;
use crate::volume::VolumeStatus;

/// Recovery/gap ratios outside this band call for a frequency change
const FAST_RECOVERY_RATIO: f64 = 0.7;
const SLOW_RECOVERY_RATIO: f64 = 1.3;

pub const DEFAULT_AVAILABLE_DAYS: u32 = 6;

// ---------------------------------------------------------------------------
/// Recovery Ratio Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyAction {
    IncreaseFrequency,
    DecreaseFrequency,
    Maintain,
    ImproveRecovery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyAnalysis {
    pub soreness_recovery_days: f64,
    pub current_session_gap: f64,
    /// Rounded to two decimals
    pub recovery_ratio: f64,
    pub recommendation: String,
    pub action: FrequencyAction,
    pub frequency_adjustment: i32,
    pub urgency: Urgency,
    pub muscle: Option<MuscleGroupId>,
}

/// Compare how long soreness lasts with the gap between sessions. When the
/// muscle's zone is known, it can veto the change: no extra session at MRV,
/// and under-minimum muscles fix recovery instead of training less.
pub fn analyze_frequency(
    soreness_recovery_days: f64,
    session_gap_days: f64,
    muscle: Option<(&MuscleGroupId, VolumeStatus)>,
) -> FrequencyAnalysis {
    let recovery = soreness_recovery_days.max(0.0);
    let gap = session_gap_days.max(1.0);
    let ratio = recovery / gap;

    let (mut recommendation, mut action, mut adjustment, urgency) = if ratio < FAST_RECOVERY_RATIO {
        (
            "You heal early -> Add one session per week",
            FrequencyAction::IncreaseFrequency,
            1,
            Urgency::Medium,
        )
    } else if ratio > SLOW_RECOVERY_RATIO {
        (
            "Recovery lags -> Insert an extra rest day",
            FrequencyAction::DecreaseFrequency,
            -1,
            Urgency::High,
        )
    } else {
        ("Frequency is optimal", FrequencyAction::Maintain, 0, Urgency::Normal)
    };

    if let Some((_, status)) = muscle {
        if status == VolumeStatus::Maximum && action == FrequencyAction::IncreaseFrequency {
            recommendation = "At MRV - maintain frequency despite early recovery";
            action = FrequencyAction::Maintain;
            adjustment = 0;
        }
        if status == VolumeStatus::UnderMinimum && action == FrequencyAction::DecreaseFrequency {
            recommendation = "Below MV - consider recovery methods instead of reducing frequency";
            action = FrequencyAction::ImproveRecovery;
            adjustment = 0;
        }
    }

    FrequencyAnalysis {
        soreness_recovery_days: recovery,
        current_session_gap: gap,
        recovery_ratio: (ratio * 100.0).round() / 100.0,
        recommendation: recommendation.to_string(),
        action,
        frequency_adjustment: adjustment,
        urgency,
        muscle: muscle.map(|(m, _)| m.clone()),
    }
}

// ---------------------------------------------------------------------------
/// Recovery Capacity & Training Age
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCapacity {
    Low,
    #[default]
    Normal,
    High,
}

impl RecoveryCapacity {
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Low => 0.8,
            Self::Normal => 1.0,
            Self::High => 1.2,
        }
    }
}

impl std::fmt::Display for RecoveryCapacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for RecoveryCapacity {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(EngineError::Config(format!("Unknown recovery capacity: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingAge {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl TrainingAge {
    /// Sessions-per-week band (min, max)
    pub fn frequency_band(&self) -> (u32, u32) {
        match self {
            Self::Beginner => (2, 3),
            Self::Intermediate => (2, 4),
            Self::Advanced => (3, 5),
        }
    }
}

impl std::fmt::Display for TrainingAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for TrainingAge {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(EngineError::Config(format!("Unknown training age: {}", s))),
        }
    }
}

// ---------------------------------------------------------------------------
/// Optimal Frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrequencyConstraints {
    pub available_days: u32,
    /// Weekly sets to plan for; the tracked sets when absent
    pub current_volume: Option<u32>,
    pub recovery_capacity: RecoveryCapacity,
    pub training_age: TrainingAge,
}

impl Default for FrequencyConstraints {
    fn default() -> Self {
        Self {
            available_days: DEFAULT_AVAILABLE_DAYS,
            current_volume: None,
            recovery_capacity: RecoveryCapacity::Normal,
            training_age: TrainingAge::Intermediate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyAlternatives {
    pub conservative: u32,
    pub aggressive: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyPlan {
    pub muscle: MuscleGroupId,
    pub recommended_frequency: u32,
    pub sets_per_session: u32,
    pub total_volume: u32,
    pub reasoning: Vec<String>,
    pub alternatives: FrequencyAlternatives,
}

/// Sessions per week before recovery capacity and training age apply
fn volume_tier_frequency(volume: u32, landmarks: &VolumeLandmarks) -> u32 {
    if volume >= landmarks.mav {
        volume.div_ceil(6).min(4)
    } else if volume >= landmarks.mev {
        volume.div_ceil(8).min(3)
    } else {
        volume.div_ceil(10).max(2)
    }
}

/// The training-age minimum wins over `available_days`; a schedule with
/// fewer days than that minimum is flagged in the reasoning.
pub fn calculate_optimal_frequency(
    muscle: &MuscleGroupId,
    landmarks: &VolumeLandmarks,
    volume: u32,
    constraints: &FrequencyConstraints,
) -> FrequencyPlan {
    let available = constraints.available_days.max(1);
    let (band_min, band_max) = constraints.training_age.frequency_band();

    let base = volume_tier_frequency(volume, landmarks);
    let adjusted = (base as f64 * constraints.recovery_capacity.multiplier()).round() as u32;
    let frequency = adjusted.min(band_max).min(available).max(band_min);

    let mut reasoning = vec![
        format!("{} weekly sets", volume),
        format!("{} recovery capacity", constraints.recovery_capacity),
        format!("{} training age", constraints.training_age),
        format!("{} available days", available),
    ];
    if available < band_min {
        reasoning.push(format!(
            "{} training needs at least {} sessions per week",
            constraints.training_age, band_min
        ));
    }

    FrequencyPlan {
        muscle: muscle.clone(),
        recommended_frequency: frequency,
        sets_per_session: volume.div_ceil(frequency),
        total_volume: volume,
        reasoning,
        alternatives: FrequencyAlternatives {
            conservative: frequency.saturating_sub(1).max(2).min(frequency),
            aggressive: (frequency + 1).min(available).max(frequency),
        },
    }
}
