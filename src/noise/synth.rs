//! Colored noise track generation.
//!
//! Every call derives a fresh seed, fresh EQ offsets, and a fresh
//! amplitude multiplier, so two runs never produce bit-identical audio
//! even for the same color, duration, and volume. The upload platform
//! flags duplicate content; the jitter is what keeps each render unique.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;

use crate::config::{EncoderSettings, NoiseSettings};
use crate::encoder::Invocation;
use crate::models::{NoiseColor, NoiseTrack};

/// Errors from noise generation and mixing.
#[derive(Error, Debug)]
pub enum NoiseError {
    #[error("Failed to launch generator: {0}")]
    LaunchFailed(String),

    #[error("Noise generation failed with exit code {exit_code}: {stderr}")]
    GenerationFailed { exit_code: i32, stderr: String },

    /// The generator exited zero but wrote nothing usable.
    #[error("Generated noise file is empty: {0}")]
    EmptyOutput(PathBuf),

    /// A track file disappeared before mixing.
    #[error("Noise track missing before mix: {0}")]
    MissingTrack(PathBuf),

    #[error("Mixing requires at least two tracks, got {0}")]
    TooFewTracks(usize),

    #[error("Mix failed with exit code {exit_code}: {stderr}")]
    MixFailed { exit_code: i32, stderr: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for noise operations.
pub type NoiseResult<T> = Result<T, NoiseError>;

/// Generates individual colored noise tracks.
pub struct NoiseSynthesizer<'a> {
    noise: &'a NoiseSettings,
    encoder: &'a EncoderSettings,
}

impl<'a> NoiseSynthesizer<'a> {
    pub fn new(noise: &'a NoiseSettings, encoder: &'a EncoderSettings) -> Self {
        Self { noise, encoder }
    }

    /// Draw randomized per-track parameters.
    ///
    /// Jitter ranges: bass [0, 5] dB, mid [-2, 2] dB, treble [-3, 3] dB,
    /// amplitude [0.95, 1.05]. Volume is clamped to [0.1, 1.0].
    pub fn draw_track<R: Rng>(
        &self,
        color: NoiseColor,
        duration_seconds: u32,
        volume: f64,
        rng: &mut R,
        path: PathBuf,
    ) -> NoiseTrack {
        NoiseTrack {
            color,
            duration_seconds,
            seed: rng.gen_range(0..=999_999),
            volume: volume.clamp(0.1, 1.0),
            bass_gain_db: rng.gen_range(0..=5),
            mid_gain_db: rng.gen_range(-2..=2),
            treble_gain_db: rng.gen_range(-3..=3),
            amplitude_variation: 0.95 + rng.gen_range(0..=100) as f64 / 1000.0,
            path,
        }
    }

    /// Build the generator argument vector for a drawn track.
    pub fn build_args(&self, track: &NoiseTrack) -> Invocation {
        let source = format!(
            "anoisesrc=color={}:duration={}:sample_rate={}:seed={}",
            track.color.filter_name(),
            track.duration_seconds,
            self.noise.sample_rate,
            track.seed
        );

        let filters = format!(
            "volume={}*{:.3},equalizer=f=100:t=q:w=1:g={},equalizer=f=1000:t=q:w=1:g={},equalizer=f=8000:t=q:w=1:g={}",
            track.volume,
            track.amplitude_variation,
            track.bass_gain_db,
            track.mid_gain_db,
            track.treble_gain_db
        );

        Invocation::new(&self.encoder.ffmpeg_path)
            .arg("-y")
            .args(["-f", "lavfi"])
            .args(["-i", &source])
            .args(["-af", &filters])
            .args(["-c:a", "libmp3lame"])
            .args(["-q:a", "2"])
            .args(["-ar", &self.noise.sample_rate.to_string()])
            .path_arg(&track.path)
    }

    /// Generate one track file.
    ///
    /// A nonzero generator exit or a zero-byte output file is fatal;
    /// the caller must not proceed to mixing with missing tracks.
    pub fn synthesize<R: Rng>(
        &self,
        color: NoiseColor,
        duration_seconds: u32,
        volume: f64,
        rng: &mut R,
        output: PathBuf,
    ) -> NoiseResult<NoiseTrack> {
        let track = self.draw_track(color, duration_seconds, volume, rng, output);
        let inv = self.build_args(&track);

        tracing::debug!(
            color = %track.color,
            seed = track.seed,
            duration = track.duration_seconds,
            "generating noise track"
        );

        let result = inv
            .run()
            .map_err(|e| NoiseError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(NoiseError::GenerationFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        let size = fs::metadata(&track.path)
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(NoiseError::EmptyOutput(track.path.clone()));
        }

        Ok(track)
    }

    /// Delete a track file, ignoring a file that is already gone.
    pub fn discard(track: &NoiseTrack) {
        if track.path.exists() {
            if let Err(e) = fs::remove_file(&track.path) {
                tracing::warn!(path = %track.path.display(), "failed to delete noise track: {}", e);
            }
        }
    }
}
