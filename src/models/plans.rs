//! Stage plans: composition layers, noise tracks, and repetition.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::{AssetCategory, NoiseColor};

/// One layer of the composition filter graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionLayer {
    /// Category this layer was resolved from.
    pub category: AssetCategory,
    /// Resolved clip path.
    pub path: PathBuf,
}

/// Ordered layer list forming the chroma-key/overlay filter graph.
///
/// The first layer is the opaque background; every later layer is keyed
/// and overlaid onto the accumulated frame. Order is front-to-back and
/// must be preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionPlan {
    pub layers: Vec<CompositionLayer>,
}

impl CompositionPlan {
    /// Build a plan from resolved layer paths in overlay order.
    pub fn new(layers: Vec<CompositionLayer>) -> Self {
        Self { layers }
    }

    /// Number of key-and-overlay operations the graph will contain.
    pub fn overlay_count(&self) -> usize {
        self.layers.len().saturating_sub(1)
    }
}

/// Parameters of one generated colored-noise track.
///
/// Seed and EQ offsets are re-randomized on every generation call so that
/// no two runs produce bit-identical audio, even for the same color,
/// duration, and volume. Tracks live only until they are mixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseTrack {
    pub color: NoiseColor,
    pub duration_seconds: u32,
    pub seed: u32,
    /// Base volume in [0.1, 1.0].
    pub volume: f64,
    /// Bass shelf gain at 100 Hz, dB in [0, 5].
    pub bass_gain_db: i32,
    /// Mid gain at 1 kHz, dB in [-2, 2].
    pub mid_gain_db: i32,
    /// Treble gain at 8 kHz, dB in [-3, 3].
    pub treble_gain_db: i32,
    /// Amplitude multiplier in [0.95, 1.05].
    pub amplitude_variation: f64,
    /// Path of the rendered track file.
    pub path: PathBuf,
}

/// Plan for expanding a short base clip to a target duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionPlan {
    pub source_path: PathBuf,
    pub base_duration_seconds: f64,
    pub target_duration_seconds: f64,
    pub tolerance_seconds: f64,
    /// Number of playlist references to the source clip.
    pub repeat_count: u64,
    /// Optional intro prepended before the repeats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_path: Option<PathBuf>,
}

impl RepetitionPlan {
    /// Compute the plan for a probed base duration.
    ///
    /// `repeat_count = round(target / base)`, minimum 1 - the integer
    /// choice minimizing `|repeat_count * base - target|`.
    pub fn compute(
        source_path: PathBuf,
        base_duration_seconds: f64,
        target_duration_seconds: f64,
        tolerance_seconds: f64,
    ) -> Self {
        let exact = target_duration_seconds / base_duration_seconds;
        let repeat_count = (exact.round() as u64).max(1);
        Self {
            source_path,
            base_duration_seconds,
            target_duration_seconds,
            tolerance_seconds,
            repeat_count,
            intro_path: None,
        }
    }

    /// Attach an intro clip to be prepended.
    pub fn with_intro(mut self, intro_path: PathBuf) -> Self {
        self.intro_path = Some(intro_path);
        self
    }

    /// Duration the repeats alone will produce.
    pub fn repeated_duration(&self) -> f64 {
        self.repeat_count as f64 * self.base_duration_seconds
    }

    /// Achieved duration including an intro of the given length.
    pub fn achieved_duration(&self, intro_duration: f64) -> f64 {
        intro_duration + self.repeated_duration()
    }

    /// Absolute deviation of the achieved duration from the target.
    pub fn variance(&self, intro_duration: f64) -> f64 {
        (self.achieved_duration(intro_duration) - self.target_duration_seconds).abs()
    }

    /// Whether the achieved duration falls outside the tolerance window.
    pub fn exceeds_tolerance(&self, intro_duration: f64) -> bool {
        self.variance(intro_duration) > self.tolerance_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(base: f64, target: f64, tolerance: f64) -> RepetitionPlan {
        RepetitionPlan::compute(PathBuf::from("/tmp/base.mp4"), base, target, tolerance)
    }

    #[test]
    fn thirty_seconds_to_ten_hours_is_exact() {
        let p = plan(30.0, 36_000.0, 60.0);
        assert_eq!(p.repeat_count, 1200);
        assert_eq!(p.achieved_duration(0.0), 36_000.0);
        assert_eq!(p.variance(0.0), 0.0);
        assert!(!p.exceeds_tolerance(0.0));
    }

    #[test]
    fn forty_seven_seconds_to_one_hour_rounds() {
        let p = plan(47.0, 3600.0, 30.0);
        // 3600 / 47 = 76.6 -> 77 repeats, 3619s achieved
        assert_eq!(p.repeat_count, 77);
        assert_eq!(p.achieved_duration(0.0), 3619.0);
        assert!((p.variance(0.0) - 19.0).abs() < 1e-9);
        assert!(!p.exceeds_tolerance(0.0));
    }

    #[test]
    fn variance_flagged_when_tolerance_tight() {
        let p = plan(47.0, 3600.0, 10.0);
        assert!(p.exceeds_tolerance(0.0));
    }

    #[test]
    fn repeat_count_is_at_least_one() {
        let p = plan(300.0, 60.0, 30.0);
        assert_eq!(p.repeat_count, 1);
    }

    #[test]
    fn rounding_minimizes_deviation() {
        for (base, target) in [(30.0, 36_000.0), (47.0, 3600.0), (290.0, 600.0), (61.0, 1800.0)] {
            let p = plan(base, target, f64::MAX);
            let n = p.repeat_count;
            let err = |k: u64| (k as f64 * base - target).abs();
            assert!(err(n) <= err(n + 1));
            if n > 1 {
                assert!(err(n) <= err(n - 1));
            }
        }
    }

    #[test]
    fn intro_counts_toward_achieved_duration() {
        let p = plan(60.0, 600.0, 30.0).with_intro(PathBuf::from("/tmp/intro.mp4"));
        assert!(p.intro_path.is_some());
        assert_eq!(p.achieved_duration(8.0), 608.0);
    }
}
