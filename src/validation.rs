//! Input validators
//!
//! Out-of-range loads, sets, RIR and mesocycle lengths are not errors: every
//! validator returns a result carrying `is_valid`, an optional warning, a
//! recommendation and a severity for the caller to surface.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::VolumeLandmarks;
use crate::volume::{classify, VolumeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Medium,
    High,
}

// ---------------------------------------------------------------------------
/// Training Goal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingGoal {
    #[default]
    Hypertrophy,
    Strength,
    Power,
    Endurance,
}

impl std::fmt::Display for TrainingGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hypertrophy => write!(f, "hypertrophy"),
            Self::Strength => write!(f, "strength"),
            Self::Power => write!(f, "power"),
            Self::Endurance => write!(f, "endurance"),
        }
    }
}

impl std::str::FromStr for TrainingGoal {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hypertrophy" => Ok(Self::Hypertrophy),
            "strength" => Ok(Self::Strength),
            "power" => Ok(Self::Power),
            "endurance" => Ok(Self::Endurance),
            _ => Err(EngineError::Config(format!("Unknown training goal: {}", s))),
        }
    }
}

/// Load window as % of 1RM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadRange {
    pub min: f64,
    pub max: f64,
    pub optimal: (f64, f64),
}

/// Mesocycle length window in weeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MesoRange {
    pub min: u32,
    pub max: u32,
    pub optimal: u32,
}

impl TrainingGoal {
    pub fn load_range(&self) -> LoadRange {
        let (min, max, optimal) = match self {
            Self::Hypertrophy => (30.0, 85.0, (65.0, 80.0)),
            Self::Strength => (70.0, 100.0, (85.0, 95.0)),
            Self::Power => (30.0, 70.0, (40.0, 60.0)),
            Self::Endurance => (20.0, 60.0, (30.0, 50.0)),
        };
        LoadRange { min, max, optimal }
    }

    pub fn meso_range(&self) -> MesoRange {
        let (min, max, optimal) = match self {
            Self::Hypertrophy => (3, 6, 4),
            Self::Strength => (2, 8, 4),
            Self::Power => (2, 4, 3),
            Self::Endurance => (4, 12, 6),
        };
        MesoRange { min, max, optimal }
    }

    /// Acceptable RIR deviation from target
    pub fn rir_tolerance(&self) -> f64 {
        match self {
            Self::Hypertrophy => 1.0,
            Self::Strength => 0.5,
            Self::Power => 1.5,
            Self::Endurance => 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
/// Load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadValidation {
    pub is_valid: bool,
    pub load: f64,
    pub goal: TrainingGoal,
    pub warning: Option<String>,
    pub recommendation: String,
    pub severity: Severity,
    pub range: LoadRange,
    pub is_optimal: bool,
}

pub fn validate_load(percent_of_1rm: f64, goal: TrainingGoal) -> LoadValidation {
    let range = goal.load_range();
    let (lo, hi) = range.optimal;

    if !percent_of_1rm.is_finite() || percent_of_1rm <= 0.0 {
        return LoadValidation {
            is_valid: false,
            load: percent_of_1rm,
            goal,
            warning: Some("Load must be a positive number".to_string()),
            recommendation: "Enter a valid load percentage".to_string(),
            severity: Severity::High,
            range,
            is_optimal: false,
        };
    }

    let load = percent_of_1rm;
    let (is_valid, warning, recommendation, severity) = if load < range.min {
        (
            false,
            Some(format!("Load too light for {} ({}% < {}%)", goal, load, range.min)),
            format!("Increase to {}-{}% for optimal {} adaptations", lo, hi, goal),
            Severity::High,
        )
    } else if load > range.max {
        (
            false,
            Some(format!("Load too heavy for {} ({}% > {}%)", goal, load, range.max)),
            format!("Reduce to {}-{}% for safer {} training", lo, hi, goal),
            Severity::High,
        )
    } else if load < lo {
        (
            true,
            Some(format!("Load is light for {} ({}% < {}%)", goal, load, lo)),
            format!("Consider increasing to {}-{}% for better stimulus", lo, hi),
            Severity::Medium,
        )
    } else if load > hi {
        (
            true,
            Some(format!("Load is heavy for {} ({}% > {}%)", goal, load, hi)),
            format!("Consider reducing to {}-{}% for better recovery", lo, hi),
            Severity::Medium,
        )
    } else {
        (true, None, format!("Good load for {} training", goal), Severity::Normal)
    };

    LoadValidation {
        is_valid,
        load,
        goal,
        warning,
        recommendation,
        severity,
        range,
        is_optimal: load >= lo && load <= hi,
    }
}

// ---------------------------------------------------------------------------
/// Sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetsValidation {
    pub is_valid: bool,
    pub sets: i64,
    pub landmarks: VolumeLandmarks,
    pub zone: Option<VolumeStatus>,
    pub warning: Option<String>,
    pub recommendation: String,
    pub severity: Severity,
    /// Sets as a percentage of MRV
    pub percentage: u32,
}

/// Up to MRV is always valid; beyond it only as a deliberate overreach.
pub fn validate_sets(proposed_sets: i64, landmarks: &VolumeLandmarks, allow_overreach: bool) -> SetsValidation {
    if proposed_sets < 0 {
        return SetsValidation {
            is_valid: false,
            sets: proposed_sets,
            landmarks: *landmarks,
            zone: None,
            warning: Some("Set count must be 0 or greater".to_string()),
            recommendation: "Enter a valid number of sets".to_string(),
            severity: Severity::High,
            percentage: 0,
        };
    }

    let sets = proposed_sets.min(u32::MAX as i64) as u32;
    let zone = classify(sets, landmarks);
    let over_mrv = sets > landmarks.mrv;

    let (is_valid, warning, recommendation, severity) = match zone {
        VolumeStatus::UnderMinimum => (
            true,
            Some(format!("Below maintenance volume ({} < {})", sets, landmarks.mv)),
            "Increase sets for minimal stimulus".to_string(),
            Severity::High,
        ),
        VolumeStatus::Maintenance => (
            true,
            Some(format!("In maintenance zone ({} < {})", sets, landmarks.mev)),
            "Increase sets for growth stimulus".to_string(),
            Severity::Medium,
        ),
        VolumeStatus::Optimal => (
            true,
            None,
            format!("Optimal volume zone ({}-{} sets)", landmarks.mev, landmarks.mav),
            Severity::Normal,
        ),
        VolumeStatus::High => (
            true,
            Some(format!("High volume zone ({} approaching {})", sets, landmarks.mrv)),
            "Monitor recovery closely".to_string(),
            Severity::Medium,
        ),
        VolumeStatus::Maximum if !over_mrv => (
            true,
            Some(format!("At maximum recoverable volume ({} = {})", sets, landmarks.mrv)),
            "Hold here and plan a deload".to_string(),
            Severity::High,
        ),
        VolumeStatus::Maximum if allow_overreach => (
            true,
            Some(format!("Overreaching territory ({} > {})", sets, landmarks.mrv)),
            "Short-term only - deload soon".to_string(),
            Severity::High,
        ),
        VolumeStatus::Maximum => (
            false,
            Some(format!(
                "Above maximum recoverable volume ({} > {})",
                sets, landmarks.mrv
            )),
            "Reduce sets or plan deload".to_string(),
            Severity::High,
        ),
    };

    let percentage = if landmarks.mrv == 0 {
        0
    } else {
        (sets as f64 / landmarks.mrv as f64 * 100.0).round() as u32
    };

    SetsValidation {
        is_valid,
        sets: proposed_sets,
        landmarks: *landmarks,
        zone: Some(zone),
        warning,
        recommendation,
        severity,
        percentage,
    }
}

// ---------------------------------------------------------------------------
/// Mesocycle Length
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MesocycleValidation {
    pub is_valid: bool,
    pub weeks: i64,
    pub goal: TrainingGoal,
    pub warning: Option<String>,
    pub recommendation: String,
    pub severity: Severity,
    pub is_optimal: bool,
    pub range: MesoRange,
}

/// Lengths outside the goal's window are flagged, never rejected. Only a
/// length under one week is structurally invalid.
pub fn validate_mesocycle_length(weeks: i64, goal: TrainingGoal) -> MesocycleValidation {
    let range = goal.meso_range();

    if weeks < 1 {
        return MesocycleValidation {
            is_valid: false,
            weeks,
            goal,
            warning: Some("Mesocycle must be at least 1 week".to_string()),
            recommendation: "Enter a valid mesocycle length".to_string(),
            severity: Severity::High,
            is_optimal: false,
            range,
        };
    }

    let (warning, recommendation, severity) = if weeks < range.min as i64 {
        (
            Some(format!(
                "Short mesocycle for {} ({} < {} weeks)",
                goal, weeks, range.min
            )),
            format!("Consider {} weeks for better {} adaptations", range.optimal, goal),
            Severity::Medium,
        )
    } else if weeks > range.max as i64 {
        (
            Some(format!(
                "Long mesocycle for {} ({} > {} weeks)",
                goal, weeks, range.max
            )),
            format!("Consider {} weeks to prevent overreaching", range.optimal),
            Severity::Medium,
        )
    } else if weeks == range.optimal as i64 {
        (None, format!("Optimal length for {} training", goal), Severity::Normal)
    } else {
        (None, format!("Good length for {} training", goal), Severity::Normal)
    };

    MesocycleValidation {
        is_valid: true,
        weeks,
        goal,
        warning,
        recommendation,
        severity,
        is_optimal: weeks == range.optimal as i64,
        range,
    }
}

// ---------------------------------------------------------------------------
/// RIR
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RirValidation {
    pub is_valid: bool,
    #[serde(rename = "actualRIR")]
    pub actual_rir: f64,
    #[serde(rename = "targetRIR")]
    pub target_rir: f64,
    pub deviation: f64,
    pub warning: Option<String>,
    pub recommendation: String,
    pub severity: Severity,
    pub is_on_target: bool,
}

/// RIR is valid in [0, 10]; the on-target tolerance depends on the goal
pub fn validate_rir(actual_rir: f64, target_rir: f64, goal: TrainingGoal) -> RirValidation {
    let deviation = (actual_rir - target_rir).abs();
    let invalid = |warning: &str, recommendation: &str| RirValidation {
        is_valid: false,
        actual_rir,
        target_rir,
        deviation,
        warning: Some(warning.to_string()),
        recommendation: recommendation.to_string(),
        severity: Severity::High,
        is_on_target: false,
    };

    if !actual_rir.is_finite() || actual_rir < 0.0 {
        return invalid(
            "RIR must be 0 or greater",
            "Enter how many more reps you could have done",
        );
    }
    if actual_rir > 10.0 {
        return invalid(
            "RIR too high (>10) - load likely too light",
            "Increase weight significantly",
        );
    }

    let tolerance = goal.rir_tolerance();
    let is_on_target = deviation <= tolerance;

    let (warning, recommendation, severity) = if is_on_target {
        (
            None,
            format!("On target ({} vs {} RIR)", actual_rir, target_rir),
            Severity::Normal,
        )
    } else if actual_rir > target_rir {
        let far = deviation > 2.0;
        (
            Some(format!("Too easy ({:.1} RIR above target)", deviation)),
            if far {
                "Increase weight significantly (10-15%)".to_string()
            } else {
                "Increase weight moderately (5-10%)".to_string()
            },
            if far { Severity::High } else { Severity::Medium },
        )
    } else {
        let far = deviation > 2.0;
        (
            Some(format!("Too hard ({:.1} RIR below target)", deviation)),
            if far {
                "Reduce weight significantly (10-15%)".to_string()
            } else {
                "Reduce weight slightly (5-10%)".to_string()
            },
            if far { Severity::High } else { Severity::Medium },
        )
    };

    RirValidation {
        is_valid: true,
        actual_rir,
        target_rir,
        deviation,
        warning,
        recommendation,
        severity,
        is_on_target,
    }
}

// ---------------------------------------------------------------------------
/// Frequency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyValidation {
    pub is_valid: bool,
    pub frequency: i64,
    pub weekly_volume: i64,
    /// Rounded to one decimal
    pub sets_per_session: f64,
    pub warning: Option<String>,
    pub recommendation: String,
    pub frequency_advice: String,
    pub severity: Severity,
}

/// Sessions per week against weekly sets: more than 20 sets a session is
/// invalid, more than 12 is heavy, under 2 (with real volume) is thin.
pub fn validate_frequency(frequency: i64, weekly_volume: i64) -> FrequencyValidation {
    let invalid = |warning: &str, recommendation: &str| FrequencyValidation {
        is_valid: false,
        frequency,
        weekly_volume,
        sets_per_session: 0.0,
        warning: Some(warning.to_string()),
        recommendation: recommendation.to_string(),
        frequency_advice: String::new(),
        severity: Severity::High,
    };

    if frequency < 1 {
        return invalid(
            "Frequency must be at least 1 session per week",
            "Train each muscle at least once per week",
        );
    }
    if weekly_volume < 0 {
        return invalid("Weekly volume must be specified", "Enter total weekly sets");
    }

    let per_session = weekly_volume as f64 / frequency as f64;

    let (is_valid, warning, recommendation, severity) = if per_session > 20.0 {
        (
            false,
            Some(format!("Too many sets per session ({:.1})", per_session)),
            "Increase frequency or reduce volume".to_string(),
            Severity::High,
        )
    } else if per_session > 12.0 {
        (
            true,
            Some(format!("High sets per session ({:.1})", per_session)),
            "Consider increasing frequency".to_string(),
            Severity::Medium,
        )
    } else if per_session < 2.0 && weekly_volume >= 6 {
        (
            true,
            Some(format!("Very low sets per session ({:.1})", per_session)),
            "Consider reducing frequency".to_string(),
            Severity::Medium,
        )
    } else {
        (
            true,
            None,
            format!("Good distribution ({:.1} sets/session)", per_session),
            Severity::Normal,
        )
    };

    let frequency_advice = match frequency {
        1 => "Once weekly - ensure high quality",
        2 => "Twice weekly - good for most goals",
        3 => "Three times weekly - high frequency",
        _ => "Very high frequency - monitor recovery",
    };

    FrequencyValidation {
        is_valid,
        frequency,
        weekly_volume,
        sets_per_session: (per_session * 10.0).round() / 10.0,
        warning,
        recommendation,
        frequency_advice: frequency_advice.to_string(),
        severity,
    }
}
