//! `periodization` command-line front end.
//!
//! Every subcommand opens the configured database, loads the engine, runs one
//! command and prints the result as pretty JSON on stdout. Logs go to stderr.
//!
//! ```bash
//! periodization summary
//! periodization set-sets Chest 12
//! periodization progression Back --soreness 1 --performance 2 --pump 2
//! RUST_LOG=debug periodization next-week
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use periodization_lib::commands::{self, advice, periodization};
use periodization_lib::effort::SessionEffort;
use periodization_lib::fatigue::{FatigueSignals, WeeklyFatigueData};
use periodization_lib::frequency::{FrequencyConstraints, RecoveryCapacity, TrainingAge};
use periodization_lib::models::{LandmarkPatch, MuscleGroupId};
use periodization_lib::state::MuscleFeedback;
use periodization_lib::stimulus::{ProgressionFeedback, StimulusFeedback};
use periodization_lib::EngineConfig;

#[derive(Parser)]
#[command(
    name = "periodization",
    about = "Adaptive volume periodization engine",
    long_about = "Track weekly sets per muscle against volume landmarks and get progression, deload and effort advice."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override
    #[arg(long, global = true)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Week, block, target RIR and recommended phase
    Summary,
    /// Full persisted record
    Snapshot,
    /// Set this week's sets for a muscle
    SetSets {
        muscle: String,
        #[arg(allow_hyphen_values = true)]
        sets: i64,
    },
    /// Add (or with a negative delta, remove) sets
    AddSets {
        muscle: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Close out the current week
    NextWeek,
    StartDeload,
    StartResensitization,
    /// Switch diet phase: bulk, cut or maintenance
    Diet { phase: String },
    /// Overwrite some of a muscle's landmarks
    Landmarks {
        muscle: String,
        #[arg(long)]
        mv: Option<u32>,
        #[arg(long)]
        mev: Option<u32>,
        #[arg(long)]
        mav: Option<u32>,
        #[arg(long)]
        mrv: Option<u32>,
    },
    /// Flag a muscle as needing recovery
    HitMrv { muscle: String },
    /// Record the reference load used for strength-drop detection
    Baseline { muscle: String, load: f64 },
    MesoLength {
        weeks: u32,
        #[arg(long)]
        goal: Option<String>,
    },
    /// Reset every muscle to MEV
    ResetWeek,
    /// Apply a JSON file of per-muscle weekly feedback
    Feedback { file: String },

    /// Volume zone for tracked or proposed sets
    Status {
        muscle: String,
        #[arg(long)]
        sets: Option<u32>,
    },
    /// Next-week set recommendation from session feedback
    Progression {
        muscle: String,
        #[arg(long, default_value_t = 0)]
        soreness: i32,
        #[arg(long, default_value_t = 0)]
        performance: i32,
        #[arg(long, default_value_t = 0)]
        mmc: i32,
        #[arg(long, default_value_t = 0)]
        pump: i32,
        #[arg(long, default_value_t = 0)]
        disruption: i32,
        #[arg(long)]
        illness: bool,
    },
    RecoveryVolume {
        muscle: String,
        #[arg(long)]
        illness: bool,
    },
    CheckVolume { muscle: String, sets: i64 },
    /// Soreness recovery time vs session gap
    Frequency {
        recovery_days: f64,
        gap_days: f64,
        #[arg(long)]
        muscle: Option<String>,
    },
    OptimalFrequency {
        muscle: String,
        #[arg(long, default_value_t = 6)]
        available_days: u32,
        #[arg(long)]
        volume: Option<u32>,
        #[arg(long, default_value = "normal")]
        recovery_capacity: String,
        #[arg(long, default_value = "intermediate")]
        training_age: String,
    },
    DeloadCheck,
    DietInfo,
    /// This week's target RIR
    Rir,
    Effort {
        actual: f64,
        #[arg(long)]
        target: Option<f64>,
        #[arg(long)]
        tolerance: Option<f64>,
    },
    /// Load advice from last session's RIR against its target
    EffortProgression {
        muscle: String,
        actual_rir: f64,
        /// Defaults to this week's target RIR
        #[arg(long)]
        target_rir: Option<f64>,
    },
    EffortSummary,
    /// Weekly fatigue score
    Fatigue {
        #[arg(long, default_value_t = 1.0)]
        soreness: f64,
        #[arg(long, default_value_t = 7.0)]
        sleep: f64,
        #[arg(long, default_value_t = 5.0)]
        stress: f64,
        #[arg(long)]
        performance_decline: bool,
    },
    HighFatigue {
        muscle: String,
        #[arg(long, default_value_t = 0)]
        soreness: i32,
        #[arg(long, default_value_t = 0)]
        joint_ache: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        perf_change: i32,
        #[arg(long, default_value_t = 0)]
        pump: i32,
        #[arg(long, default_value_t = 0)]
        disruption: i32,
        #[arg(long)]
        last_load: Option<f64>,
    },

    ValidateLoad {
        percent: f64,
        #[arg(long)]
        goal: Option<String>,
    },
    ValidateSets {
        muscle: String,
        #[arg(allow_hyphen_values = true)]
        sets: i64,
        #[arg(long)]
        allow_overreach: bool,
    },
    ValidateMeso {
        #[arg(allow_hyphen_values = true)]
        weeks: i64,
        #[arg(long)]
        goal: Option<String>,
    },
    ValidateRir {
        actual: f64,
        target: f64,
        #[arg(long)]
        goal: Option<String>,
    },
    ValidateFrequency { frequency: i64, weekly_volume: i64 },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = EngineConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    // Pure validators need no engine
    match &cli.command {
        Command::ValidateLoad { percent, goal } => {
            return print_json(&advice::validate_load(*percent, goal.clone())?);
        }
        Command::ValidateMeso { weeks, goal } => {
            return print_json(&advice::validate_mesocycle_length(*weeks, goal.clone())?);
        }
        Command::ValidateRir { actual, target, goal } => {
            return print_json(&advice::validate_rir(*actual, *target, goal.clone())?);
        }
        Command::ValidateFrequency {
            frequency,
            weekly_volume,
        } => {
            return print_json(&advice::validate_frequency(*frequency, *weekly_volume));
        }
        _ => {}
    }

    let state = commands::bootstrap(&config).await?;
    let state = &*state;

    match cli.command {
        Command::Summary => print_json(&advice::get_state_summary(state).await?),
        Command::Snapshot => print_json(&advice::get_snapshot(state).await?),
        Command::SetSets { muscle, sets } => {
            print_json(&periodization::update_weekly_sets(state, muscle, sets).await?)
        }
        Command::AddSets { muscle, delta } => print_json(&periodization::add_sets(state, muscle, delta).await?),
        Command::NextWeek => print_json(&periodization::next_week(state).await?),
        Command::StartDeload => print_json(&periodization::start_deload(state).await?),
        Command::StartResensitization => {
            periodization::start_resensitization(state).await?;
            print_json(&advice::get_state_summary(state).await?)
        }
        Command::Diet { phase } => print_json(&periodization::set_diet_phase(state, phase).await?),
        Command::Landmarks {
            muscle,
            mv,
            mev,
            mav,
            mrv,
        } => {
            let patch = LandmarkPatch { mv, mev, mav, mrv };
            print_json(&periodization::update_volume_landmarks(state, muscle, patch).await?)
        }
        Command::HitMrv { muscle } => print_json(&periodization::hit_mrv(state, muscle).await?),
        Command::Baseline { muscle, load } => {
            periodization::set_baseline_strength(state, muscle, load).await?;
            print_json(&load)
        }
        Command::MesoLength { weeks, goal } => print_json(&periodization::set_meso_length(state, weeks, goal).await?),
        Command::ResetWeek => {
            periodization::reset_week(state).await?;
            print_json(&advice::get_snapshot(state).await?.current_week_sets)
        }
        Command::Feedback { file } => {
            let json = fs::read_to_string(&file)?;
            let feedback: BTreeMap<MuscleGroupId, MuscleFeedback> = serde_json::from_str(&json)?;
            print_json(&periodization::process_weekly_feedback(state, feedback).await?)
        }
        Command::Status { muscle, sets } => print_json(&advice::analyze_volume_status(state, muscle, sets).await?),
        Command::Progression {
            muscle,
            soreness,
            performance,
            mmc,
            pump,
            disruption,
            illness,
        } => {
            let feedback = ProgressionFeedback {
                stimulus: StimulusFeedback { mmc, pump, disruption },
                soreness,
                performance,
                has_illness: illness,
            };
            print_json(&advice::get_volume_progression(state, muscle, feedback).await?)
        }
        Command::RecoveryVolume { muscle, illness } => {
            print_json(&advice::calculate_recovery_volume(state, muscle, illness).await?)
        }
        Command::CheckVolume { muscle, sets } => print_json(&advice::validate_volume_input(state, muscle, sets).await?),
        Command::Frequency {
            recovery_days,
            gap_days,
            muscle,
        } => print_json(&advice::analyze_frequency(state, recovery_days, gap_days, muscle).await?),
        Command::OptimalFrequency {
            muscle,
            available_days,
            volume,
            recovery_capacity,
            training_age,
        } => {
            let constraints = FrequencyConstraints {
                available_days,
                current_volume: volume,
                recovery_capacity: recovery_capacity.parse::<RecoveryCapacity>()?,
                training_age: training_age.parse::<TrainingAge>()?,
            };
            print_json(&advice::calculate_optimal_frequency(state, muscle, constraints).await?)
        }
        Command::DeloadCheck => print_json(&advice::get_deload_assessment(state).await?),
        Command::DietInfo => print_json(&advice::get_diet_phase_info(state).await?),
        Command::Rir => print_json(&advice::get_target_rir(state).await?),
        Command::Effort {
            actual,
            target,
            tolerance,
        } => print_json(&advice::validate_effort_level(state, actual, target, tolerance).await?),
        Command::EffortProgression {
            muscle,
            actual_rir,
            target_rir,
        } => {
            let target_rir = match target_rir {
                Some(target) => target,
                None => advice::get_target_rir(state).await?.target_rir,
            };
            let last_session = SessionEffort { actual_rir, target_rir };
            print_json(&advice::get_effort_progression(state, muscle, last_session).await?)
        }
        Command::EffortSummary => print_json(&advice::get_weekly_effort_summary(state).await?),
        Command::Fatigue {
            soreness,
            sleep,
            stress,
            performance_decline,
        } => {
            let data = WeeklyFatigueData {
                average_soreness: soreness,
                sleep_quality: sleep,
                stress_level: stress,
                performance_decline,
                ..Default::default()
            };
            print_json(&advice::assess_fatigue(state, data).await?)
        }
        Command::HighFatigue {
            muscle,
            soreness,
            joint_ache,
            perf_change,
            pump,
            disruption,
            last_load,
        } => {
            let signals = FatigueSignals {
                soreness,
                joint_ache,
                perf_change,
                pump,
                disruption,
                last_load,
            };
            print_json(&advice::check_high_fatigue(state, muscle, signals).await?)
        }
        Command::ValidateSets {
            muscle,
            sets,
            allow_overreach,
        } => print_json(&advice::validate_sets(state, muscle, sets, allow_overreach).await?),
        Command::ValidateLoad { .. }
        | Command::ValidateMeso { .. }
        | Command::ValidateRir { .. }
        | Command::ValidateFrequency { .. } => Ok(()),
    }
}
