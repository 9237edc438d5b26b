//! The duration expander.
//!
//! Probes the base clip, computes the round-to-nearest repeat count,
//! conforms an optional intro to the base clip's stream spec, and runs
//! a single stream-copy concat over a reference playlist.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EncoderSettings;
use crate::encoder::Invocation;
use crate::media::{probe_duration_secs, probe_media_spec, ProbeError};
use crate::models::{MediaSpec, RepetitionPlan};

use super::playlist::ConcatPlaylist;

/// Errors from the expansion stage.
#[derive(Error, Debug)]
pub enum ExpandError {
    /// Probing the base clip failed or returned a non-positive duration.
    /// The expander never guesses a duration.
    #[error("Duration probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Failed to launch encoder: {0}")]
    LaunchFailed(String),

    /// Conforming the intro to the base spec failed. A mismatched intro
    /// must never reach the concat, so this is fatal rather than
    /// degradable to a no-intro output mid-flight.
    #[error("Intro conform failed with exit code {exit_code}: {stderr}")]
    ConformFailed { exit_code: i32, stderr: String },

    /// The concat tool exited nonzero; partial output is not usable.
    #[error("Concatenation failed with exit code {exit_code}: {stderr}")]
    ConcatFailed { exit_code: i32, stderr: String },

    #[error("Failed to write playlist {path}: {source}")]
    PlaylistWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for expansion operations.
pub type ExpandResult<T> = Result<T, ExpandError>;

/// Outcome of one expansion.
#[derive(Debug, Clone)]
pub struct ExpandOutcome {
    pub output_path: PathBuf,
    pub plan: RepetitionPlan,
    /// Computed duration: intro (if any) + repeats * base.
    pub achieved_duration_seconds: f64,
    /// |achieved - target|.
    pub variance_seconds: f64,
    /// True when the variance exceeded the tolerance (logged, not fatal).
    pub variance_flagged: bool,
}

/// Expands a short clip to a target duration via playlist concatenation.
pub struct DurationExpander<'a> {
    settings: &'a EncoderSettings,
}

impl<'a> DurationExpander<'a> {
    pub fn new(settings: &'a EncoderSettings) -> Self {
        Self { settings }
    }

    /// Build the intro conform argument vector.
    ///
    /// Scale-and-pad preserves the intro's aspect ratio inside the base
    /// clip's frame; frame rate, sample rate, and channel count are
    /// forced to the base spec so the streams are byte-compatible for
    /// stream-copy concatenation.
    pub fn build_conform_args(
        &self,
        intro: &Path,
        spec: &MediaSpec,
        output: &Path,
    ) -> Invocation {
        let vf = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps}",
            w = spec.width,
            h = spec.height,
            fps = spec.frame_rate_arg()
        );

        Invocation::new(&self.settings.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .path_arg(intro)
            .args(["-vf", &vf])
            .args(["-c:v", "libx264"])
            .args(["-preset", &self.settings.preset])
            .args(["-crf", "23"])
            .args(["-c:a", "aac"])
            .args(["-b:a", "192k"])
            .args(["-ar", &spec.sample_rate.to_string()])
            .args(["-ac", &spec.channel_count.to_string()])
            .path_arg(output)
    }

    /// Build the stream-copy concat argument vector.
    pub fn build_concat_args(&self, playlist: &Path, output: &Path) -> Invocation {
        Invocation::new(&self.settings.ffmpeg_path)
            .arg("-y")
            .args(["-f", "concat"])
            .args(["-safe", "0"])
            .arg("-i")
            .path_arg(playlist)
            .args(["-c", "copy"])
            .path_arg(output)
    }

    /// Expand `source` to approximately `target_duration_seconds`.
    ///
    /// The source is a shared pipeline artifact and is not deleted here;
    /// the playlist and the conformed intro temp are cleaned up before
    /// returning, success or failure.
    pub fn expand(
        &self,
        source: &Path,
        target_duration_seconds: f64,
        tolerance_seconds: f64,
        intro: Option<&Path>,
        work_dir: &Path,
        output: &Path,
    ) -> ExpandResult<ExpandOutcome> {
        let playlist_path = work_dir.join("concat_list.txt");
        let conformed_intro = work_dir.join("intro_conformed.mp4");

        let result = self.run_expand(
            source,
            target_duration_seconds,
            tolerance_seconds,
            intro,
            &playlist_path,
            &conformed_intro,
            output,
        );

        remove_if_exists(&playlist_path);
        remove_if_exists(&conformed_intro);

        result
    }

    #[allow(clippy::too_many_arguments)]
    fn run_expand(
        &self,
        source: &Path,
        target_duration_seconds: f64,
        tolerance_seconds: f64,
        intro: Option<&Path>,
        playlist_path: &Path,
        conformed_intro: &Path,
        output: &Path,
    ) -> ExpandResult<ExpandOutcome> {
        // 1. Probe; fail fast on anything non-positive.
        let base_duration = probe_duration_secs(self.settings, source)?;

        // 2. Round-to-nearest repeat count, minimum 1.
        let mut plan = RepetitionPlan::compute(
            source.to_path_buf(),
            base_duration,
            target_duration_seconds,
            tolerance_seconds,
        );

        tracing::info!(
            base_duration,
            target = target_duration_seconds,
            repeat_count = plan.repeat_count,
            "computed repetition plan"
        );

        // 3. Conform the intro to the base spec before it may be concatenated.
        let mut intro_duration = 0.0;
        if let Some(intro_path) = intro {
            let spec = probe_media_spec(self.settings, source)?;
            self.conform_intro(intro_path, &spec, conformed_intro)?;
            intro_duration = probe_duration_secs(self.settings, conformed_intro)?;
            plan = plan.with_intro(conformed_intro.to_path_buf());
        }

        // 4. Reference playlist: optional intro, then N lines naming the
        //    same source file.
        let mut playlist = ConcatPlaylist::new();
        if let Some(intro_entry) = &plan.intro_path {
            playlist.push(intro_entry);
        }
        playlist.push_repeated(source, plan.repeat_count);
        playlist
            .write_to(playlist_path)
            .map_err(|e| ExpandError::PlaylistWrite {
                path: playlist_path.to_path_buf(),
                source: e,
            })?;

        // 5. One stream-copy concat pass.
        let inv = self.build_concat_args(playlist_path, output);
        let result = inv
            .run()
            .map_err(|e| ExpandError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(ExpandError::ConcatFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        // 6. Variance beyond tolerance is logged, never fatal.
        let achieved = plan.achieved_duration(intro_duration);
        let variance = plan.variance(intro_duration);
        let flagged = plan.exceeds_tolerance(intro_duration);
        if flagged {
            tracing::warn!(
                achieved,
                target = target_duration_seconds,
                variance,
                tolerance = tolerance_seconds,
                "achieved duration outside tolerance"
            );
        }

        Ok(ExpandOutcome {
            output_path: output.to_path_buf(),
            plan,
            achieved_duration_seconds: achieved,
            variance_seconds: variance,
            variance_flagged: flagged,
        })
    }

    fn conform_intro(
        &self,
        intro: &Path,
        spec: &MediaSpec,
        output: &Path,
    ) -> ExpandResult<()> {
        tracing::info!(intro = %intro.display(), spec = %spec, "conforming intro to base spec");

        let inv = self.build_conform_args(intro, spec, output);
        let result = inv
            .run()
            .map_err(|e| ExpandError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(ExpandError::ConformFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        Ok(())
    }
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "failed to delete temp file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_720p25() -> MediaSpec {
        MediaSpec {
            width: 1280,
            height: 720,
            frame_rate: 25.0,
            sample_rate: 44100,
            channel_count: 2,
        }
    }

    #[test]
    fn conform_targets_base_spec_not_intro_spec() {
        // Intro is 1920x1080@30; base is 1280x720@25. The conform filter
        // must target the base spec.
        let settings = EncoderSettings::default();
        let expander = DurationExpander::new(&settings);
        let inv = expander.build_conform_args(
            Path::new("/assets/intros/welcome.mp4"),
            &spec_720p25(),
            Path::new("/work/intro_conformed.mp4"),
        );

        let vf = inv
            .arg_slice()
            .iter()
            .find(|a| a.starts_with("scale="))
            .unwrap();
        assert!(vf.contains("scale=1280:720"));
        assert!(vf.contains("pad=1280:720"));
        assert!(vf.contains("fps=25"));

        let joined = inv.arg_slice().join(" ");
        assert!(joined.contains("-ar 44100"));
        assert!(joined.contains("-ac 2"));
    }

    #[test]
    fn conform_preserves_aspect_ratio() {
        let settings = EncoderSettings::default();
        let expander = DurationExpander::new(&settings);
        let inv = expander.build_conform_args(
            Path::new("/i.mp4"),
            &spec_720p25(),
            Path::new("/o.mp4"),
        );

        let vf = inv
            .arg_slice()
            .iter()
            .find(|a| a.starts_with("scale="))
            .unwrap();
        assert!(vf.contains("force_original_aspect_ratio=decrease"));
        assert!(vf.contains("(ow-iw)/2:(oh-ih)/2"));
    }

    #[test]
    fn concat_is_stream_copy_over_playlist() {
        let settings = EncoderSettings::default();
        let expander = DurationExpander::new(&settings);
        let inv = expander.build_concat_args(
            Path::new("/work/concat_list.txt"),
            Path::new("/outputs/final.mp4"),
        );

        let joined = inv.arg_slice().join(" ");
        assert!(joined.contains("-f concat"));
        assert!(joined.contains("-safe 0"));
        assert!(joined.contains("-c copy"));
        assert!(!joined.contains("libx264"));
    }

    #[test]
    fn expand_fails_fast_on_missing_source() {
        let settings = EncoderSettings::default();
        let expander = DurationExpander::new(&settings);
        let dir = tempfile::tempdir().unwrap();

        let result = expander.expand(
            Path::new("/nonexistent/base.mp4"),
            36_000.0,
            60.0,
            None,
            dir.path(),
            &dir.path().join("final.mp4"),
        );

        assert!(matches!(
            result,
            Err(ExpandError::Probe(ProbeError::FileNotFound(_)))
        ));
        // No temp files left behind.
        assert!(!dir.path().join("concat_list.txt").exists());
    }
}
