//! Stimulus & Set Progression Advice
//!
//! Pure functions that turn session feedback into a set-count change, gated
//! by where the muscle currently sits relative to its landmarks.

use serde::{Deserialize, Serialize};

use crate::models::{MuscleGroupId, VolumeLandmarks};
use crate::volume::{classify, VolumeStatus};

/// Feedback ratings live on a 0-3 scale
const RATING_MAX: i32 = 3;

/// Proposed weekly sets above this multiple of MRV are rejected outright
const OVERREACH_LIMIT: f64 = 1.2;

fn rating(value: i32) -> u32 {
    value.clamp(0, RATING_MAX) as u32
}

// ---------------------------------------------------------------------------
/// Progression Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "sets", rename_all = "snake_case")]
pub enum ProgressionAction {
    #[serde(rename = "add_sets")]
    Add(u32),
    Maintain,
    #[serde(rename = "reduce_sets")]
    Reduce(u32),
    /// Replace the session's volume with the computed recovery volume
    Recovery,
}

impl ProgressionAction {
    /// Literal set delta; `None` for recovery, which has no fixed delta
    pub fn set_change(&self) -> Option<i64> {
        match self {
            Self::Add(n) => Some(*n as i64),
            Self::Maintain => Some(0),
            Self::Reduce(n) => Some(-(*n as i64)),
            Self::Recovery => None,
        }
    }

    pub fn adds_sets(&self) -> bool {
        matches!(self, Self::Add(n) if *n > 0)
    }
}

impl std::fmt::Display for ProgressionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add(_) => write!(f, "add_sets"),
            Self::Maintain => write!(f, "maintain"),
            Self::Reduce(_) => write!(f, "reduce_sets"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

// ---------------------------------------------------------------------------
/// Stimulus Scoring
// ---------------------------------------------------------------------------

/// Mind-muscle connection, pump and disruption, each rated 0-3
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StimulusFeedback {
    #[serde(default)]
    pub mmc: i32,
    #[serde(default)]
    pub pump: i32,
    #[serde(default)]
    pub disruption: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StimulusScore {
    pub score: u32,
    pub action: ProgressionAction,
    pub set_change: i64,
    pub advice: String,
    /// The clamped ratings that produced the score
    pub breakdown: StimulusFeedback,
}

pub fn score_stimulus(feedback: &StimulusFeedback) -> StimulusScore {
    let breakdown = StimulusFeedback {
        mmc: rating(feedback.mmc) as i32,
        pump: rating(feedback.pump) as i32,
        disruption: rating(feedback.disruption) as i32,
    };
    let score = (breakdown.mmc + breakdown.pump + breakdown.disruption) as u32;

    let (action, advice) = match score {
        0..=3 => (
            ProgressionAction::Add(2),
            format!("Stimulus too low ({}/9) -> Add 2 sets next session", score),
        ),
        4..=6 => (
            ProgressionAction::Maintain,
            format!("Stimulus adequate ({}/9) -> Keep sets the same", score),
        ),
        _ => (
            ProgressionAction::Reduce(1),
            format!("Stimulus excessive ({}/9) -> Remove 1-2 sets next session", score),
        ),
    };

    StimulusScore {
        score,
        action,
        set_change: action.set_change().unwrap_or(0),
        advice,
        breakdown,
    }
}

// ---------------------------------------------------------------------------
/// Set Progression Matrix (soreness x performance)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixAdvice {
    pub action: ProgressionAction,
    pub advice: &'static str,
}

const fn add(sets: u32, advice: &'static str) -> MatrixAdvice {
    MatrixAdvice {
        action: ProgressionAction::Add(sets),
        advice,
    }
}

const HOLD: MatrixAdvice = MatrixAdvice {
    action: ProgressionAction::Maintain,
    advice: "Hold sets at current level",
};

const RECOVER: MatrixAdvice = MatrixAdvice {
    action: ProgressionAction::Recovery,
    advice: "Do recovery session",
};

/// Rows are soreness 0..3 (none to high), columns performance 0..3
/// (worse to much better)
const PROGRESSION_MATRIX: [[MatrixAdvice; 4]; 4] = [
    [
        add(1, "Add 1 set next session"),
        add(2, "Add 2 sets next session"),
        add(2, "Add 2-3 sets next session"),
        add(3, "Add 2-3 sets next session"),
    ],
    [
        HOLD,
        add(1, "Add 1 set next session"),
        add(2, "Add 2 sets next session"),
        add(2, "Add 2-3 sets next session"),
    ],
    [RECOVER, HOLD, HOLD, add(1, "Add 1 set next session")],
    [RECOVER, RECOVER, RECOVER, HOLD],
];

pub fn set_progression_algorithm(soreness: i32, performance: i32) -> MatrixAdvice {
    PROGRESSION_MATRIX[rating(soreness) as usize][rating(performance) as usize]
}

// ---------------------------------------------------------------------------
/// Volume Status Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Normal,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalysis {
    pub muscle: MuscleGroupId,
    pub current_sets: u32,
    pub landmarks: VolumeLandmarks,
    pub status: VolumeStatus,
    /// Current sets as a percentage of MRV
    pub percentage: u32,
    pub recommendation: String,
    pub urgency: Urgency,
}

fn percent_of(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

pub fn analyze_volume_status(muscle: &MuscleGroupId, sets: u32, landmarks: &VolumeLandmarks) -> VolumeAnalysis {
    let status = classify(sets, landmarks);
    let (recommendation, urgency) = match status {
        VolumeStatus::UnderMinimum => (
            format!("Below MV ({}). Increase volume significantly.", landmarks.mv),
            Urgency::High,
        ),
        VolumeStatus::Maintenance => (
            format!(
                "In maintenance zone ({}-{}). Consider increasing for growth.",
                landmarks.mv, landmarks.mev
            ),
            Urgency::Low,
        ),
        VolumeStatus::Optimal => (
            format!(
                "In optimal zone ({}-{}). Continue progressive overload.",
                landmarks.mev, landmarks.mav
            ),
            Urgency::Normal,
        ),
        VolumeStatus::High => (
            format!(
                "High volume zone ({}-{}). Monitor recovery closely.",
                landmarks.mav, landmarks.mrv
            ),
            Urgency::Medium,
        ),
        VolumeStatus::Maximum => (
            format!("At/above MRV ({}). Deload recommended.", landmarks.mrv),
            Urgency::High,
        ),
    };

    VolumeAnalysis {
        muscle: muscle.clone(),
        current_sets: sets,
        landmarks: *landmarks,
        status,
        percentage: percent_of(sets, landmarks.mrv),
        recommendation,
        urgency,
    }
}

// ---------------------------------------------------------------------------
/// Volume Input Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInputCheck {
    pub is_valid: bool,
    pub warning: Option<String>,
    pub proposed_sets: i64,
    pub landmarks: VolumeLandmarks,
}

/// Valid when 0 <= sets <= 1.2 * MRV. Below MV or above MRV only warns.
pub fn validate_volume_input(proposed_sets: i64, landmarks: &VolumeLandmarks) -> VolumeInputCheck {
    let is_valid = proposed_sets >= 0 && proposed_sets as f64 <= landmarks.mrv as f64 * OVERREACH_LIMIT;

    let warning = if proposed_sets < 0 {
        Some("Sets cannot be negative".to_string())
    } else if proposed_sets > landmarks.mrv as i64 {
        Some(format!("Above MRV ({}). Consider deload.", landmarks.mrv))
    } else if proposed_sets < landmarks.mv as i64 {
        Some(format!(
            "Below MV ({}). May not be sufficient for adaptation.",
            landmarks.mv
        ))
    } else {
        None
    };

    VolumeInputCheck {
        is_valid,
        warning,
        proposed_sets,
        landmarks: *landmarks,
    }
}

// ---------------------------------------------------------------------------
/// Recovery Volume
// ---------------------------------------------------------------------------

/// max(round((MEV + MRV) / 2) - (illness ? 2 : 1), ceil(MEV / 2))
pub fn recovery_volume(landmarks: &VolumeLandmarks, has_illness: bool) -> u32 {
    let midpoint = ((landmarks.mev + landmarks.mrv) as f64 / 2.0).round() as i64;
    let reduced = midpoint - if has_illness { 2 } else { 1 };
    let floor = (landmarks.mev as f64 * 0.5).ceil() as i64;
    reduced.max(floor).max(0) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryVolume {
    pub muscle: MuscleGroupId,
    pub recommended_sets: u32,
    pub reasoning: String,
    pub landmarks: VolumeLandmarks,
    /// Recommended sets as a percentage of MEV
    pub percentage: u32,
}

pub fn calculate_recovery_volume(muscle: &MuscleGroupId, landmarks: &VolumeLandmarks, has_illness: bool) -> RecoveryVolume {
    let recommended_sets = recovery_volume(landmarks, has_illness);
    RecoveryVolume {
        muscle: muscle.clone(),
        recommended_sets,
        reasoning: if has_illness {
            "illness adjustment".to_string()
        } else {
            "standard recovery".to_string()
        },
        landmarks: *landmarks,
        percentage: percent_of(recommended_sets, landmarks.mev),
    }
}

// ---------------------------------------------------------------------------
/// Volume Progression
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionFeedback {
    pub stimulus: StimulusFeedback,
    /// 0 none .. 3 high
    pub soreness: i32,
    /// 0 worse .. 3 much better
    pub performance: i32,
    pub has_illness: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProgression {
    pub muscle: MuscleGroupId,
    pub current_sets: u32,
    pub projected_sets: u32,
    pub set_change: i64,
    pub action: ProgressionAction,
    pub advice: String,
    pub stimulus_score: u32,
    pub volume_status: VolumeStatus,
}

/// Matrix advice with two zone overrides: nothing is added at MRV and
/// under-minimum muscles always get +2. A recovery verdict from the matrix
/// is resolved last, into the delta that lands on the recovery volume.
pub fn volume_progression(
    muscle: &MuscleGroupId,
    current_sets: u32,
    landmarks: &VolumeLandmarks,
    feedback: &ProgressionFeedback,
) -> VolumeProgression {
    let stimulus = score_stimulus(&feedback.stimulus);
    let matrix = set_progression_algorithm(feedback.soreness, feedback.performance);
    let status = classify(current_sets, landmarks);

    let mut action = matrix.action;
    let mut advice = matrix.advice.to_string();

    if status == VolumeStatus::Maximum && action.adds_sets() {
        action = ProgressionAction::Maintain;
        advice = "At MRV limit. Hold sets or consider deload.".to_string();
    }

    if status == VolumeStatus::UnderMinimum && !action.adds_sets() {
        action = ProgressionAction::Add(2);
        advice = "Below minimum volume. Add sets regardless of fatigue.".to_string();
    }

    let set_change = if matrix.action == ProgressionAction::Recovery {
        let recovery = calculate_recovery_volume(muscle, landmarks, feedback.has_illness);
        action = ProgressionAction::Recovery;
        advice = format!(
            "Recovery session: {} sets ({})",
            recovery.recommended_sets, recovery.reasoning
        );
        recovery.recommended_sets as i64 - current_sets as i64
    } else {
        action.set_change().unwrap_or(0)
    };

    let projected_sets = (current_sets as i64 + set_change).max(0) as u32;

    VolumeProgression {
        muscle: muscle.clone(),
        current_sets,
        projected_sets,
        set_change,
        action,
        advice,
        stimulus_score: stimulus.score,
        volume_status: status,
    }
}
