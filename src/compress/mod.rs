//! Compressing the merged clip down to a byte-size budget.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EncoderSettings;
use crate::encoder::Invocation;
use crate::media::{probe_duration_secs, ProbeError};

/// Floor for the computed video bitrate, in bits/second.
///
/// Pathologically short durations can drive the budget formula negative;
/// anything below this floor never reaches the encoder.
const MIN_VIDEO_BITRATE: u64 = 100_000;

/// Fraction of the byte budget given to the streams; the rest absorbs
/// container overhead and VBR burst.
const SIZE_SAFETY_MARGIN: f64 = 0.9;

/// Errors from the compression stage.
#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Compression input missing: {0}")]
    MissingInput(PathBuf),

    #[error("Failed to probe input: {0}")]
    Probe(#[from] ProbeError),

    #[error("Failed to launch encoder: {0}")]
    LaunchFailed(String),

    #[error("Compression failed with exit code {exit_code}: {stderr}")]
    EncoderFailed { exit_code: i32, stderr: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for compression operations.
pub type CompressResult<T> = Result<T, CompressError>;

/// Outcome of one compression call.
#[derive(Debug, Clone)]
pub struct CompressOutcome {
    pub output_path: PathBuf,
    /// True when the input already fit the budget and was byte-copied.
    pub skipped_reencode: bool,
    pub input_size_bytes: u64,
    pub output_size_bytes: u64,
}

impl CompressOutcome {
    /// Size reduction factor (1.0 when nothing changed).
    pub fn ratio(&self) -> f64 {
        if self.output_size_bytes == 0 {
            return 1.0;
        }
        self.input_size_bytes as f64 / self.output_size_bytes as f64
    }
}

/// Compute the target video bitrate in bits/second for a byte budget.
///
/// `((target_bytes * 0.9) - audio_bytes) * 8 / duration`, clamped to the
/// bitrate floor.
pub fn compute_video_bitrate(target_size_mb: u64, duration_secs: f64, audio_kbps: u64) -> u64 {
    let target_bytes = target_size_mb as f64 * 1024.0 * 1024.0 * SIZE_SAFETY_MARGIN;
    let audio_bytes = audio_kbps as f64 * 1000.0 * duration_secs / 8.0;
    let video_bits = (target_bytes - audio_bytes) * 8.0;
    let bitrate = video_bits / duration_secs;

    if bitrate.is_finite() && bitrate > MIN_VIDEO_BITRATE as f64 {
        bitrate as u64
    } else {
        MIN_VIDEO_BITRATE
    }
}

/// Re-encodes a clip to fit a size budget, or copies it if it already fits.
pub struct SizeBudgetCompressor<'a> {
    settings: &'a EncoderSettings,
}

impl<'a> SizeBudgetCompressor<'a> {
    pub fn new(settings: &'a EncoderSettings) -> Self {
        Self { settings }
    }

    /// Build the capped-rate encode argument vector.
    ///
    /// CRF with `-maxrate` gives a quality-biased encode under a hard
    /// cap instead of pure CBR, which shows fewer artifacts on smooth
    /// gradient content.
    pub fn build_args(&self, input: &Path, output: &Path, video_bitrate: u64) -> Invocation {
        Invocation::new(&self.settings.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .path_arg(input)
            .args(["-c:v", "libx264"])
            .args(["-crf", &self.settings.compress_crf.to_string()])
            .args(["-maxrate", &video_bitrate.to_string()])
            .args(["-bufsize", &(video_bitrate * 2).to_string()])
            .args(["-preset", &self.settings.preset])
            .args(["-profile:v", "high"])
            .args(["-level", "4.1"])
            .args(["-pix_fmt", "yuv420p"])
            .args(["-movflags", "+faststart"])
            .args(["-c:a", "aac"])
            .args(["-b:a", &format!("{}k", self.settings.audio_bitrate_kbps)])
            .args(["-ar", "44100"])
            .path_arg(output)
    }

    /// Compress `input` to at most `target_size_mb`, writing `output`.
    ///
    /// Deletes the input on success (it is a consumed intermediate).
    pub fn compress(
        &self,
        input: &Path,
        output: &Path,
        target_size_mb: u64,
    ) -> CompressResult<CompressOutcome> {
        if !input.exists() {
            return Err(CompressError::MissingInput(input.to_path_buf()));
        }

        let input_size = fs::metadata(input)
            .map_err(|e| CompressError::Io {
                path: input.to_path_buf(),
                source: e,
            })?
            .len();
        let input_mb = input_size / (1024 * 1024);

        if input_mb <= target_size_mb {
            tracing::info!(
                input_mb,
                target_size_mb,
                "input already within budget, copying without re-encode"
            );
            fs::copy(input, output).map_err(|e| CompressError::Io {
                path: output.to_path_buf(),
                source: e,
            })?;
            fs::remove_file(input).map_err(|e| CompressError::Io {
                path: input.to_path_buf(),
                source: e,
            })?;
            return Ok(CompressOutcome {
                output_path: output.to_path_buf(),
                skipped_reencode: true,
                input_size_bytes: input_size,
                output_size_bytes: input_size,
            });
        }

        let duration = probe_duration_secs(self.settings, input)?;
        let video_bitrate =
            compute_video_bitrate(target_size_mb, duration, self.settings.audio_bitrate_kbps);

        tracing::info!(
            input_mb,
            target_size_mb,
            duration_secs = duration,
            video_bitrate,
            "compressing to size budget"
        );

        let inv = self.build_args(input, output, video_bitrate);
        let result = inv
            .run()
            .map_err(|e| CompressError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(CompressError::EncoderFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        let output_size = fs::metadata(output)
            .map_err(|e| CompressError::Io {
                path: output.to_path_buf(),
                source: e,
            })?
            .len();

        let outcome = CompressOutcome {
            output_path: output.to_path_buf(),
            skipped_reencode: false,
            input_size_bytes: input_size,
            output_size_bytes: output_size,
        };

        tracing::info!(
            achieved_mb = output_size / (1024 * 1024),
            ratio = outcome.ratio(),
            "compression complete"
        );

        fs::remove_file(input).map_err(|e| CompressError::Io {
            path: input.to_path_buf(),
            source: e,
        })?;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn bitrate_formula_matches_budget() {
        // 150 MB over 600s with 128k audio:
        // (150*1024*1024*0.9 - 128000*600/8) * 8 / 600
        let bitrate = compute_video_bitrate(150, 600.0, 128);
        let expected = ((150.0 * 1024.0 * 1024.0 * 0.9 - 128_000.0 * 600.0 / 8.0) * 8.0
            / 600.0) as u64;
        assert_eq!(bitrate, expected);
        assert!(bitrate > MIN_VIDEO_BITRATE);
    }

    #[test]
    fn pathological_duration_clamps_to_floor() {
        // Tiny budget over a huge duration drives the formula negative.
        assert_eq!(compute_video_bitrate(1, 100_000.0, 128), MIN_VIDEO_BITRATE);
        // Zero duration must not divide through.
        assert_eq!(compute_video_bitrate(100, 0.0, 128), MIN_VIDEO_BITRATE);
    }

    #[test]
    fn small_input_is_byte_copied() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.mp4");
        let output = dir.path().join("out.mp4");
        let mut f = fs::File::create(&input).unwrap();
        f.write_all(b"tiny video payload").unwrap();
        drop(f);

        let settings = EncoderSettings::default();
        let compressor = SizeBudgetCompressor::new(&settings);
        let outcome = compressor.compress(&input, &output, 150).unwrap();

        assert!(outcome.skipped_reencode);
        assert_eq!(fs::read(&output).unwrap(), b"tiny video payload");
        // Input consumed.
        assert!(!input.exists());
    }

    #[test]
    fn capped_rate_args() {
        let settings = EncoderSettings::default();
        let compressor = SizeBudgetCompressor::new(&settings);
        let inv = compressor.build_args(
            Path::new("/work/in.mp4"),
            Path::new("/work/out.mp4"),
            2_000_000,
        );

        let joined = inv.arg_slice().join(" ");
        assert!(joined.contains("-crf 22"));
        assert!(joined.contains("-maxrate 2000000"));
        assert!(joined.contains("-bufsize 4000000"));
    }

    #[test]
    fn missing_input_is_error() {
        let settings = EncoderSettings::default();
        let compressor = SizeBudgetCompressor::new(&settings);
        let result = compressor.compress(
            Path::new("/nonexistent/in.mp4"),
            Path::new("/nonexistent/out.mp4"),
            100,
        );
        assert!(matches!(result, Err(CompressError::MissingInput(_))));
    }
}
