//! Duration profiles - pipeline variants as data.
//!
//! One parameterized pipeline runs every output format; the differences
//! between a 10-hour long-form video and a 10-minute short are captured
//! here instead of in separate code paths.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enums::AssetVariant;

/// How a profile's target duration is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDuration {
    /// A fixed hour count plus 0-15 random minutes so durations read as
    /// natural rather than machine-exact.
    Hours { hours: u32 },
    /// A uniformly random minute count in [min_minutes, max_minutes].
    MinuteRange { min_minutes: u32, max_minutes: u32 },
}

impl TargetDuration {
    /// Resolve to a concrete second count using the run's RNG.
    ///
    /// Called once per run; the resolved value is threaded through the
    /// run context rather than cached in any shared state.
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> u64 {
        match *self {
            TargetDuration::Hours { hours } => {
                let jitter_minutes = rng.gen_range(0..=15u64);
                (hours as u64 * 60 + jitter_minutes) * 60
            }
            TargetDuration::MinuteRange {
                min_minutes,
                max_minutes,
            } => rng.gen_range(min_minutes..=max_minutes) as u64 * 60,
        }
    }

    /// Nominal hour count used in generated titles and descriptions.
    pub fn nominal_hours(&self) -> u32 {
        match *self {
            TargetDuration::Hours { hours } => hours,
            TargetDuration::MinuteRange { .. } => 1,
        }
    }
}

/// Everything that distinguishes one pipeline variant from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurationProfile {
    /// Profile name, used in job entries and logs.
    pub name: String,
    /// Which duration variant of the source assets to composite.
    pub base_variant: AssetVariant,
    /// Target duration policy.
    pub target: TargetDuration,
    /// Allowed deviation of achieved duration before a warning is logged.
    pub tolerance_seconds: f64,
    /// Byte-size budget for the compressed base clip, in MB.
    pub size_budget_mb: u64,
    /// Whether to prepend an intro clip when one is available.
    pub include_intro: bool,
}

impl DurationProfile {
    /// Long-form profile for the given hour count.
    ///
    /// Size budgets follow the published channel targets: 1h -> 300 MB,
    /// 3h -> 800 MB, 10h -> 2000 MB.
    pub fn long_form(hours: u32) -> Self {
        let size_budget_mb = match hours {
            1 => 300,
            3 => 800,
            10 => 2000,
            _ => 500,
        };
        Self {
            name: format!("long_{}h", hours),
            base_variant: AssetVariant::Full,
            target: TargetDuration::Hours { hours },
            tolerance_seconds: 600.0,
            size_budget_mb,
            include_intro: true,
        }
    }

    /// Short-form profile: 5-30 minutes from one-minute preview assets.
    pub fn short_form() -> Self {
        Self {
            name: "short".to_string(),
            base_variant: AssetVariant::Preview,
            target: TargetDuration::MinuteRange {
                min_minutes: 5,
                max_minutes: 30,
            },
            tolerance_seconds: 90.0,
            size_budget_mb: 50,
            include_intro: true,
        }
    }

    /// All preset profiles.
    pub fn presets() -> Vec<DurationProfile> {
        vec![
            Self::long_form(1),
            Self::long_form(3),
            Self::long_form(10),
            Self::short_form(),
        ]
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<DurationProfile> {
        Self::presets().into_iter().find(|p| p.name == name)
    }
}
