//! Effort Schedule (RIR)
//!
//! Target reps-in-reserve falls linearly from `start` in week 1 to `end` in
//! the final week of the mesocycle.

use serde::{Deserialize, Serialize};

use crate::models::MuscleGroupId;
use crate::stimulus::Urgency;
use crate::volume::VolumeStatus;

pub const DEFAULT_START_RIR: f64 = 3.0;
pub const DEFAULT_END_RIR: f64 = 0.5;
pub const DEFAULT_RIR_TOLERANCE: f64 = 1.0;

/// Last-session deviation (in RIR) that triggers a load change
const LOAD_CHANGE_THRESHOLD: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityLevel {
    Low,
    Moderate,
    High,
    Maximum,
}

impl IntensityLevel {
    pub fn for_rir(rir: f64) -> Self {
        if rir >= 2.5 {
            Self::Low
        } else if rir >= 2.0 {
            Self::Moderate
        } else if rir >= 1.0 {
            Self::High
        } else {
            Self::Maximum
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "Focus on form and mind-muscle connection",
            Self::Moderate => "Balanced effort - challenge without excessive fatigue",
            Self::High => "High effort - monitor recovery closely",
            Self::Maximum => "Maximum effort - deload approaching",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRir {
    #[serde(rename = "targetRIR")]
    pub target_rir: f64,
    /// Target rounded to the nearest 0.5 for display
    pub rounded: f64,
    pub warning: Option<String>,
    pub intensity_level: IntensityLevel,
    pub advice: String,
    /// Percent of the way through the mesocycle
    pub progression: u32,
    pub week: u32,
    pub meso_length: u32,
}

fn round_to_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

/// Linear RIR interpolation. Weeks past the end of the mesocycle return
/// `start` with a warning instead of extrapolating.
pub fn target_rir(week: u32, meso_len: u32, start: f64, end: f64) -> TargetRir {
    let week = week.max(1);
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };

    let (target, warning, progression) = if week > meso_len {
        (start, Some("Week exceeds mesocycle length".to_string()), 0.0)
    } else if meso_len <= 1 {
        (start, None, 0.0)
    } else {
        let elapsed = (week - 1) as f64 / (meso_len - 1) as f64;
        let raw = start - (start - end) * elapsed;
        (raw.max(lo).min(hi), None, elapsed * 100.0)
    };

    let intensity_level = IntensityLevel::for_rir(target);

    TargetRir {
        target_rir: target,
        rounded: round_to_half(target),
        warning,
        intensity_level,
        advice: intensity_level.advice().to_string(),
        progression: progression.round() as u32,
        week,
        meso_length: meso_len,
    }
}

// ---------------------------------------------------------------------------
/// Effort Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortCheck {
    #[serde(rename = "actualRIR")]
    pub actual_rir: f64,
    #[serde(rename = "targetRIR")]
    pub target_rir: f64,
    pub deviation: f64,
    pub is_within_tolerance: bool,
    pub feedback: String,
    pub recommendation: String,
    pub urgency: Urgency,
}

/// Compare reported RIR with the target. More than two RIR off is urgent.
pub fn validate_effort_level(actual_rir: f64, target_rir: f64, tolerance: f64) -> EffortCheck {
    let deviation = (actual_rir - target_rir).abs();
    let is_within_tolerance = deviation <= tolerance;
    let far_off = deviation > 2.0;

    let (feedback, recommendation, urgency) = if is_within_tolerance {
        (
            format!("On target ({} vs {} RIR)", actual_rir, target_rir),
            "Continue current effort level",
            Urgency::Normal,
        )
    } else if actual_rir > target_rir {
        (
            format!("Too easy ({} RIR above target)", deviation),
            if far_off {
                "Increase weight significantly"
            } else {
                "Increase weight moderately"
            },
            if far_off { Urgency::High } else { Urgency::Medium },
        )
    } else {
        (
            format!("Too hard ({} RIR below target)", deviation),
            if far_off {
                "Reduce weight significantly"
            } else {
                "Reduce weight slightly"
            },
            if far_off { Urgency::High } else { Urgency::Medium },
        )
    };

    EffortCheck {
        actual_rir,
        target_rir,
        deviation,
        is_within_tolerance,
        feedback,
        recommendation: recommendation.to_string(),
        urgency,
    }
}

// ---------------------------------------------------------------------------
/// Effort Progression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEffort {
    #[serde(rename = "actualRIR")]
    pub actual_rir: f64,
    #[serde(rename = "targetRIR")]
    pub target_rir: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightChange {
    Increase,
    Maintain,
    Decrease,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffortProgression {
    pub muscle: MuscleGroupId,
    #[serde(rename = "currentTargetRIR")]
    pub current_target_rir: f64,
    #[serde(rename = "projectedRIR")]
    pub projected_rir: f64,
    pub weight_recommendation: WeightChange,
    pub advice: String,
    pub volume_status: VolumeStatus,
}

/// Load advice for the next session. Muscles at MRV never get heavier.
pub fn effort_progression(
    muscle: &MuscleGroupId,
    current_target_rir: f64,
    volume_status: VolumeStatus,
    last_session: &SessionEffort,
) -> EffortProgression {
    let at_mrv = volume_status == VolumeStatus::Maximum;

    let (mut weight, rir_adjustment, mut advice) =
        if last_session.actual_rir < last_session.target_rir - LOAD_CHANGE_THRESHOLD {
            (WeightChange::Decrease, 0.5, "Reduce weight to hit target RIR")
        } else if last_session.actual_rir > last_session.target_rir + LOAD_CHANGE_THRESHOLD {
            (WeightChange::Increase, -0.5, "Increase weight to hit target RIR")
        } else if at_mrv {
            (WeightChange::Maintain, 0.0, "Maintain weight - at volume limit")
        } else {
            (WeightChange::Maintain, 0.0, "Good effort level - continue progression")
        };

    if at_mrv && weight == WeightChange::Increase {
        weight = WeightChange::Maintain;
        advice = "At MRV - avoid adding intensity stress";
    }

    EffortProgression {
        muscle: muscle.clone(),
        current_target_rir,
        projected_rir: (current_target_rir + rir_adjustment).max(0.0),
        weight_recommendation: weight,
        advice: advice.to_string(),
        volume_status,
    }
}

// ---------------------------------------------------------------------------
/// Weekly Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyEffortSummary {
    pub current_week: u32,
    pub meso_length: u32,
    #[serde(rename = "targetRIR")]
    pub target_rir: f64,
    pub weekly_advice: Vec<String>,
    pub phase_description: String,
}

pub fn phase_description(week: u32, meso_len: u32) -> &'static str {
    let percentage = week as f64 / meso_len.max(1) as f64 * 100.0;
    if percentage <= 25.0 {
        "Accumulation Phase - Building foundation"
    } else if percentage <= 60.0 {
        "Progression Phase - Steady overload"
    } else if percentage <= 85.0 {
        "Intensification Phase - High demands"
    } else {
        "Peak Phase - Maximum effort"
    }
}

pub fn weekly_effort_summary(week: u32, meso_len: u32, target_rir: f64) -> WeeklyEffortSummary {
    let advice: [&str; 2] = if week == 1 {
        [
            "Focus on technique and mind-muscle connection",
            "Establish baseline weights for the mesocycle",
        ]
    } else if week == meso_len {
        [
            "Peak intensity week - push close to failure",
            "Prepare for upcoming deload",
        ]
    } else if week as f64 > meso_len as f64 * 0.75 {
        [
            "High intensity phase - monitor recovery closely",
            "Focus on performance over volume additions",
        ]
    } else {
        [
            "Progressive overload phase - gradually increase demands",
            "Balance volume and intensity progression",
        ]
    };

    WeeklyEffortSummary {
        current_week: week,
        meso_length: meso_len,
        target_rir,
        weekly_advice: advice.iter().map(|s| s.to_string()).collect(),
        phase_description: phase_description(week, meso_len).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_rir_exact_endpoints() {
        let first = target_rir(1, 4, DEFAULT_START_RIR, DEFAULT_END_RIR);
        assert_eq!(first.target_rir, 3.0);
        assert_eq!(first.intensity_level, IntensityLevel::Low);
        assert_eq!(first.progression, 0);

        let last = target_rir(4, 4, DEFAULT_START_RIR, DEFAULT_END_RIR);
        assert_eq!(last.target_rir, 0.5);
        assert_eq!(last.intensity_level, IntensityLevel::Maximum);
        assert_eq!(last.progression, 100);
        assert!(last.warning.is_none());
    }

    #[test]
    fn test_target_rir_interpolates() {
        let week2 = target_rir(2, 4, DEFAULT_START_RIR, DEFAULT_END_RIR);
        // 3 - 2.5 / 3
        crate::test_utils::assert_close(week2.target_rir, 2.1666);
        assert_eq!(week2.rounded, 2.0);
        assert_eq!(week2.intensity_level, IntensityLevel::Moderate);
        assert_eq!(week2.progression, 33);
    }

    #[test]
    fn test_target_rir_past_meso_warns() {
        let result = target_rir(6, 4, DEFAULT_START_RIR, DEFAULT_END_RIR);
        assert_eq!(result.target_rir, 3.0);
        assert!(result.warning.is_some());
        assert_eq!(result.progression, 0);
    }

    #[test]
    fn test_target_rir_single_week_meso() {
        let result = target_rir(1, 1, DEFAULT_START_RIR, DEFAULT_END_RIR);
        assert_eq!(result.target_rir, 3.0);
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_validate_effort_level() {
        let on = validate_effort_level(2.5, 2.0, DEFAULT_RIR_TOLERANCE);
        assert!(on.is_within_tolerance);
        assert_eq!(on.urgency, Urgency::Normal);

        let easy = validate_effort_level(5.0, 2.0, DEFAULT_RIR_TOLERANCE);
        assert!(!easy.is_within_tolerance);
        assert_eq!(easy.recommendation, "Increase weight significantly");
        assert_eq!(easy.urgency, Urgency::High);

        let hard = validate_effort_level(0.0, 1.5, DEFAULT_RIR_TOLERANCE);
        assert_eq!(hard.recommendation, "Reduce weight slightly");
        assert_eq!(hard.urgency, Urgency::Medium);
    }

    #[test]
    fn test_effort_progression() {
        let muscle = MuscleGroupId::from("Chest");
        let easy = SessionEffort {
            actual_rir: 4.0,
            target_rir: 2.0,
        };
        let result = effort_progression(&muscle, 2.0, VolumeStatus::Optimal, &easy);
        assert_eq!(result.weight_recommendation, WeightChange::Increase);
        assert_eq!(result.projected_rir, 1.5);

        let capped = effort_progression(&muscle, 2.0, VolumeStatus::Maximum, &easy);
        assert_eq!(capped.weight_recommendation, WeightChange::Maintain);
        assert_eq!(capped.advice, "At MRV - avoid adding intensity stress");

        let hard = SessionEffort {
            actual_rir: 0.0,
            target_rir: 2.0,
        };
        let result = effort_progression(&muscle, 0.5, VolumeStatus::High, &hard);
        assert_eq!(result.weight_recommendation, WeightChange::Decrease);
        assert_eq!(result.projected_rir, 1.0);
    }

    #[test]
    fn test_weekly_summary() {
        let summary = weekly_effort_summary(1, 4, 3.0);
        assert_eq!(summary.weekly_advice.len(), 2);
        assert_eq!(summary.phase_description, "Accumulation Phase - Building foundation");

        let peak = weekly_effort_summary(4, 4, 0.5);
        assert_eq!(peak.weekly_advice[0], "Peak intensity week - push close to failure");
        assert_eq!(peak.phase_description, "Peak Phase - Maximum effort");

        assert_eq!(phase_description(2, 4), "Progression Phase - Steady overload");
        assert_eq!(phase_description(3, 4), "Intensification Phase - High demands");
    }
}
