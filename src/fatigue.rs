//! Fatigue Signals
//!
//! Stimulus-to-fatigue ratio, rep-strength drop and the weekly fatigue
//! accumulation score.

use serde::{Deserialize, Serialize};

/// Baseline load assumed for a muscle with no recorded baseline
pub const DEFAULT_BASELINE_STRENGTH: f64 = 100.0;

/// Loads below this fraction of baseline count as a strength drop
const STRENGTH_DROP_RATIO: f64 = 0.97;

/// Per-session fatigue feedback for one muscle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FatigueSignals {
    pub soreness: i32,
    pub joint_ache: i32,
    /// Performance vs last session; negative means worse
    pub perf_change: i32,
    pub pump: i32,
    pub disruption: i32,
    /// Load used this session, compared against the baseline
    pub last_load: Option<f64>,
}

/// A load more than 3% under baseline. Missing or unusable loads (zero,
/// negative, non-finite) never count as a drop.
pub fn rep_strength_drop(last_load: f64, baseline: f64) -> bool {
    let usable = |load: f64| load.is_finite() && load > 0.0;
    usable(last_load) && usable(baseline) && last_load < baseline * STRENGTH_DROP_RATIO
}

/// Stimulus (pump + disruption) over fatigue (soreness + joint ache, +2 on
/// a performance drop), with the denominator floored at 1
pub fn stimulus_to_fatigue_ratio(signals: &FatigueSignals) -> f64 {
    let fatigue = signals.soreness + signals.joint_ache + if signals.perf_change < 0 { 2 } else { 0 };
    let stimulus = signals.pump + signals.disruption;
    stimulus as f64 / fatigue.max(1) as f64
}

/// SFR at or below 1, or a rep-strength drop against `baseline`
pub fn is_high_fatigue(signals: &FatigueSignals, baseline: f64) -> bool {
    let strength_drop = signals
        .last_load
        .map(|load| rep_strength_drop(load, baseline))
        .unwrap_or(false);
    stimulus_to_fatigue_ratio(signals) <= 1.0 || strength_drop
}

// ---------------------------------------------------------------------------
/// Fatigue Accumulation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyFatigueData {
    /// 0-3
    pub average_soreness: f64,
    /// 1-10, higher is better
    pub sleep_quality: f64,
    /// 1-10
    pub stress_level: f64,
    pub muscles_needing_recovery: u32,
    #[serde(rename = "consecutiveMRVWeeks")]
    pub consecutive_mrv_weeks: u32,
    pub performance_decline: bool,
}

impl Default for WeeklyFatigueData {
    fn default() -> Self {
        Self {
            average_soreness: 1.0,
            sleep_quality: 7.0,
            stress_level: 5.0,
            muscles_needing_recovery: 0,
            consecutive_mrv_weeks: 0,
            performance_decline: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    Low,
    Moderate,
    High,
    Excessive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeloadUrgency {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueBreakdown {
    pub soreness: f64,
    pub sleep: f64,
    pub stress: f64,
    pub volume: f64,
    pub consecutive: f64,
    pub performance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueAccumulation {
    /// 0-100
    pub fatigue_score: u32,
    pub fatigue_level: FatigueLevel,
    pub recommendations: Vec<String>,
    pub deload_urgency: DeloadUrgency,
    pub breakdown: FatigueBreakdown,
}

pub fn assess_fatigue_accumulation(data: &WeeklyFatigueData) -> FatigueAccumulation {
    let breakdown = FatigueBreakdown {
        soreness: (data.average_soreness / 3.0 * 30.0).min(30.0),
        sleep: (20.0 - data.sleep_quality / 10.0 * 20.0).max(0.0),
        stress: data.stress_level / 10.0 * 20.0,
        volume: (data.muscles_needing_recovery as f64 / 12.0 * 20.0).min(20.0),
        consecutive: (data.consecutive_mrv_weeks as f64 * 5.0).min(10.0),
        performance: if data.performance_decline { 10.0 } else { 0.0 },
    };

    let score = breakdown.soreness
        + breakdown.sleep
        + breakdown.stress
        + breakdown.volume
        + breakdown.consecutive
        + breakdown.performance;

    let (fatigue_level, deload_urgency, recommendations): (_, _, &[&str]) = if score <= 25.0 {
        (
            FatigueLevel::Low,
            DeloadUrgency::None,
            &[
                "Continue current program",
                "Consider volume progression opportunities",
            ],
        )
    } else if score <= 50.0 {
        (
            FatigueLevel::Moderate,
            DeloadUrgency::Low,
            &["Monitor recovery closely", "Ensure adequate sleep and nutrition"],
        )
    } else if score <= 75.0 {
        (
            FatigueLevel::High,
            DeloadUrgency::Medium,
            &[
                "Reduce training stress",
                "Consider recovery week",
                "Prioritize sleep and stress management",
            ],
        )
    } else {
        (
            FatigueLevel::Excessive,
            DeloadUrgency::High,
            &[
                "Implement deload immediately",
                "Address sleep and lifestyle factors",
                "Consider extending deload period",
            ],
        )
    };

    FatigueAccumulation {
        fatigue_score: score.max(0.0).round() as u32,
        fatigue_level,
        recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        deload_urgency,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rep_strength_drop_threshold() {
        assert!(!rep_strength_drop(97.0, 100.0));
        assert!(rep_strength_drop(96.9, 100.0));
        assert!(!rep_strength_drop(120.0, 100.0));
    }

    #[test]
    fn test_unusable_loads_are_not_a_drop() {
        assert!(!rep_strength_drop(0.0, 100.0));
        assert!(!rep_strength_drop(-10.0, 100.0));
        assert!(!rep_strength_drop(f64::NAN, 100.0));
        assert!(!rep_strength_drop(50.0, 0.0));

        // Good stimulus, so only a strength drop could flag it
        let signals = FatigueSignals {
            pump: 3,
            disruption: 3,
            last_load: Some(0.0),
            ..Default::default()
        };
        assert!(!is_high_fatigue(&signals, 100.0));
        let dropped = FatigueSignals {
            last_load: Some(90.0),
            ..signals
        };
        assert!(is_high_fatigue(&dropped, 100.0));
    }

    #[test]
    fn test_high_fatigue_from_sfr() {
        // Stimulus 4 vs fatigue 2: fine
        let fresh = FatigueSignals {
            soreness: 1,
            joint_ache: 1,
            pump: 2,
            disruption: 2,
            ..Default::default()
        };
        assert_eq!(stimulus_to_fatigue_ratio(&fresh), 2.0);
        assert!(!is_high_fatigue(&fresh, DEFAULT_BASELINE_STRENGTH));

        // Performance drop adds 2 to fatigue: 4 / 4
        let worse = FatigueSignals {
            perf_change: -1,
            ..fresh
        };
        assert!(is_high_fatigue(&worse, DEFAULT_BASELINE_STRENGTH));
    }

    #[test]
    fn test_high_fatigue_zero_fatigue_floor() {
        let signals = FatigueSignals {
            pump: 1,
            ..Default::default()
        };
        // 1 / max(0, 1)
        assert!(is_high_fatigue(&signals, DEFAULT_BASELINE_STRENGTH));

        let strong = FatigueSignals {
            pump: 3,
            disruption: 1,
            ..Default::default()
        };
        assert!(!is_high_fatigue(&strong, DEFAULT_BASELINE_STRENGTH));
    }

    #[test]
    fn test_high_fatigue_from_strength_drop() {
        let signals = FatigueSignals {
            pump: 3,
            disruption: 3,
            last_load: Some(90.0),
            ..Default::default()
        };
        assert!(is_high_fatigue(&signals, DEFAULT_BASELINE_STRENGTH));
        assert!(!is_high_fatigue(&signals, 80.0));
    }

    #[test]
    fn test_fatigue_accumulation_defaults() {
        // 10 + 6 + 10
        let result = assess_fatigue_accumulation(&WeeklyFatigueData::default());
        assert_eq!(result.fatigue_score, 26);
        assert_eq!(result.fatigue_level, FatigueLevel::Moderate);
        assert_eq!(result.deload_urgency, DeloadUrgency::Low);
    }

    #[test]
    fn test_fatigue_accumulation_excessive() {
        let data = WeeklyFatigueData {
            average_soreness: 3.0,
            sleep_quality: 3.0,
            stress_level: 8.0,
            muscles_needing_recovery: 12,
            consecutive_mrv_weeks: 3,
            performance_decline: true,
        };
        let result = assess_fatigue_accumulation(&data);
        assert_eq!(result.fatigue_score, 100);
        assert_eq!(result.fatigue_level, FatigueLevel::Excessive);
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(result.breakdown.consecutive, 10.0);
    }

    #[test]
    fn test_fatigue_accumulation_low() {
        let data = WeeklyFatigueData {
            average_soreness: 0.0,
            sleep_quality: 10.0,
            stress_level: 2.0,
            ..Default::default()
        };
        let result = assess_fatigue_accumulation(&data);
        assert_eq!(result.fatigue_score, 4);
        assert_eq!(result.fatigue_level, FatigueLevel::Low);
        assert_eq!(result.deload_urgency, DeloadUrgency::None);
    }
}
