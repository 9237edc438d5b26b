//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::assets::AssetResolver;
use crate::config::Settings;
use crate::logging::RunLogger;
use crate::models::{CompositionPlan, DurationProfile, NoiseColor, RepetitionPlan};

/// Read-only context passed to pipeline steps.
///
/// Holds everything resolved once per run: the profile, the jittered
/// target duration, the run-scoped RNG, and the namespaced directories.
/// Mutable results go in [`RunState`].
pub struct RunContext {
    /// Pipeline variant being produced.
    pub profile: DurationProfile,
    /// Application settings.
    pub settings: Settings,
    /// Unique run identifier; every intermediate path is namespaced by it.
    pub run_id: String,
    /// Target duration resolved from the profile at context construction.
    /// Threaded here explicitly rather than cached in any shared state.
    pub target_duration_seconds: u64,
    /// Run-specific working directory (under work_root).
    pub work_dir: PathBuf,
    /// Output directory for the final video.
    pub output_dir: PathBuf,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    /// Run-scoped RNG driving asset picks and noise jitter.
    rng: Mutex<StdRng>,
}

impl RunContext {
    /// Create a context, resolving the target duration from the profile.
    pub fn new(
        profile: DurationProfile,
        settings: Settings,
        run_id: impl Into<String>,
        work_dir: PathBuf,
        output_dir: PathBuf,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self::with_rng(
            profile,
            settings,
            run_id,
            work_dir,
            output_dir,
            logger,
            StdRng::from_entropy(),
        )
    }

    /// Create a context with an explicit RNG (tests use a fixed seed).
    pub fn with_rng(
        profile: DurationProfile,
        settings: Settings,
        run_id: impl Into<String>,
        work_dir: PathBuf,
        output_dir: PathBuf,
        logger: Arc<RunLogger>,
        mut rng: StdRng,
    ) -> Self {
        let target_duration_seconds = profile.target.resolve(&mut rng);
        Self {
            profile,
            settings,
            run_id: run_id.into(),
            target_duration_seconds,
            work_dir,
            output_dir,
            logger,
            rng: Mutex::new(rng),
        }
    }

    /// Lock the run RNG.
    pub fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock()
    }

    /// Path of an intermediate file inside the run's work directory.
    pub fn work_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    /// Resolver over the configured asset root.
    pub fn asset_resolver(&self) -> AssetResolver {
        AssetResolver::new(&self.settings.paths.asset_root)
    }

    /// Path of the final output video for this run.
    pub fn final_output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.mp4", self.profile.name, self.run_id))
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// This is the write-once manifest: each step records its output in its
/// own section and never overwrites another step's data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run identifier.
    pub run_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Composition results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compose: Option<ComposeOutput>,
    /// Soundtrack results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soundtrack: Option<SoundtrackOutput>,
    /// Mux results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mux: Option<MuxOutput>,
    /// Compression results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<CompressOutput>,
    /// Expansion results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<ExpandStepOutput>,
    /// Upload results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadOutput>,
}

impl RunState {
    /// Create a new run state with the given ID.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Path of the final video, if the run got that far.
    pub fn final_output(&self) -> Option<&Path> {
        self.expand.as_ref().map(|e| e.output_path.as_path())
    }
}

/// Output from the Compose step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeOutput {
    /// Path of the composed base clip.
    pub video_path: PathBuf,
    /// The layer plan that was rendered.
    pub plan: CompositionPlan,
}

/// Output from the Soundtrack step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundtrackOutput {
    /// Path of the mixed soundtrack.
    pub audio_path: PathBuf,
    /// Colors that went into the mix.
    pub colors: Vec<NoiseColor>,
    /// Duration the tracks were generated for.
    pub duration_seconds: u32,
}

/// Output from the Mux step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxOutput {
    /// Path of the merged clip.
    pub merged_path: PathBuf,
    /// Whether the video stream was copied without re-encoding.
    pub video_stream_copied: bool,
}

/// Output from the Compress step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressOutput {
    /// Path of the budget-fitted clip.
    pub output_path: PathBuf,
    /// True when the input already fit the budget.
    pub skipped_reencode: bool,
}

/// Output from the Expand step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandStepOutput {
    /// Path of the final expanded video.
    pub output_path: PathBuf,
    /// The repetition plan that was executed.
    pub plan: RepetitionPlan,
    /// Computed achieved duration.
    pub achieved_duration_seconds: f64,
    /// |achieved - target|.
    pub variance_seconds: f64,
    /// Whether the variance warning fired.
    pub variance_flagged: bool,
}

/// Output from the Upload step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutput {
    /// Platform id of the uploaded video.
    pub video_id: String,
    /// Title the video went out with.
    pub title: String,
    /// Playlists the video was added to.
    pub playlists_added: usize,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}
