//! Merging the composed video with the mixed soundtrack.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::EncoderSettings;
use crate::encoder::Invocation;
use crate::media::{probe_video_codec, ProbeError};

/// Video codecs that can be stream-copied into an MP4 container.
const COPY_SAFE_CODECS: &[&str] = &["h264", "hevc"];

/// Errors from the mux stage.
#[derive(Error, Debug)]
pub enum MuxError {
    /// A required input file is absent. Fatal precondition, not retried.
    #[error("Mux input missing: {0}")]
    MissingInput(PathBuf),

    #[error("Failed to probe video codec: {0}")]
    Probe(#[from] ProbeError),

    #[error("Failed to launch encoder: {0}")]
    LaunchFailed(String),

    #[error("Merge failed with exit code {exit_code}: {stderr}")]
    MergeFailed { exit_code: i32, stderr: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for mux operations.
pub type MuxResult<T> = Result<T, MuxError>;

/// Outcome of one merge.
#[derive(Debug, Clone)]
pub struct MuxOutcome {
    pub output_path: PathBuf,
    /// True when the video stream was copied without re-encoding.
    pub video_stream_copied: bool,
}

/// Merges a video track with an audio track into one file.
pub struct AvMuxer<'a> {
    settings: &'a EncoderSettings,
}

impl<'a> AvMuxer<'a> {
    pub fn new(settings: &'a EncoderSettings) -> Self {
        Self { settings }
    }

    /// Whether a probed video codec allows stream copy into MP4.
    pub fn can_stream_copy(codec: &str) -> bool {
        COPY_SAFE_CODECS.contains(&codec)
    }

    /// Build the merge argument vector.
    ///
    /// Video is stream-copied when `copy_video` - re-encoding a
    /// multi-hour stream purely to attach audio would dominate the run
    /// time. `-shortest` truncates to the shorter input; video is
    /// normally the constraint.
    pub fn build_args(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        copy_video: bool,
    ) -> Invocation {
        let inv = Invocation::new(&self.settings.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .path_arg(video)
            .arg("-i")
            .path_arg(audio);

        let inv = if copy_video {
            inv.args(["-c:v", "copy"])
        } else {
            inv.args(["-c:v", "libx264"])
                .args(["-preset", &self.settings.preset])
        };

        inv.args(["-c:a", "aac"])
            .args(["-b:a", &format!("{}k", self.settings.audio_bitrate_kbps)])
            .args(["-ar", "44100"])
            .arg("-shortest")
            .path_arg(output)
    }

    /// Merge video and audio, deleting both inputs on success.
    ///
    /// Output duration is `min(video_duration, audio_duration)`.
    pub fn merge(&self, video: &Path, audio: &Path, output: &Path) -> MuxResult<MuxOutcome> {
        if !video.exists() {
            return Err(MuxError::MissingInput(video.to_path_buf()));
        }
        if !audio.exists() {
            return Err(MuxError::MissingInput(audio.to_path_buf()));
        }

        let codec = probe_video_codec(self.settings, video)?;
        let copy_video = Self::can_stream_copy(&codec);
        if !copy_video {
            tracing::info!(codec = %codec, "video codec not copy-safe, re-encoding");
        }

        let inv = self.build_args(video, audio, output, copy_video);
        let result = inv
            .run()
            .map_err(|e| MuxError::LaunchFailed(e.to_string()))?;

        if !result.success {
            return Err(MuxError::MergeFailed {
                exit_code: result.exit_code,
                stderr: result.stderr_tail(20),
            });
        }

        // Inputs are large and consumed; free the disk immediately.
        fs::remove_file(video).map_err(|e| MuxError::Io {
            path: video.to_path_buf(),
            source: e,
        })?;
        fs::remove_file(audio).map_err(|e| MuxError::Io {
            path: audio.to_path_buf(),
            source: e,
        })?;

        Ok(MuxOutcome {
            output_path: output.to_path_buf(),
            video_stream_copied: copy_video,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_safe_codecs() {
        assert!(AvMuxer::can_stream_copy("h264"));
        assert!(AvMuxer::can_stream_copy("hevc"));
        assert!(!AvMuxer::can_stream_copy("mpeg2video"));
        assert!(!AvMuxer::can_stream_copy("vp9"));
    }

    #[test]
    fn stream_copy_args_avoid_reencode() {
        let settings = EncoderSettings::default();
        let muxer = AvMuxer::new(&settings);
        let inv = muxer.build_args(
            Path::new("/work/video.mp4"),
            Path::new("/work/audio.mp3"),
            Path::new("/work/merged.mp4"),
            true,
        );

        let joined = inv.arg_slice().join(" ");
        assert!(joined.contains("-c:v copy"));
        assert!(!joined.contains("libx264"));
        assert!(joined.contains("-shortest"));
    }

    #[test]
    fn mismatched_codec_args_reencode() {
        let settings = EncoderSettings::default();
        let muxer = AvMuxer::new(&settings);
        let inv = muxer.build_args(
            Path::new("/work/video.mp4"),
            Path::new("/work/audio.mp3"),
            Path::new("/work/merged.mp4"),
            false,
        );

        let joined = inv.arg_slice().join(" ");
        assert!(joined.contains("-c:v libx264"));
        assert!(!joined.contains("-c:v copy"));
    }

    #[test]
    fn audio_settings_applied() {
        let settings = EncoderSettings {
            audio_bitrate_kbps: 192,
            ..EncoderSettings::default()
        };
        let muxer = AvMuxer::new(&settings);
        let inv = muxer.build_args(
            Path::new("/v.mp4"),
            Path::new("/a.mp3"),
            Path::new("/o.mp4"),
            true,
        );

        let joined = inv.arg_slice().join(" ");
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-b:a 192k"));
    }

    #[test]
    fn missing_video_is_fatal_precondition() {
        let settings = EncoderSettings::default();
        let muxer = AvMuxer::new(&settings);
        let result = muxer.merge(
            Path::new("/nonexistent/video.mp4"),
            Path::new("/nonexistent/audio.mp3"),
            Path::new("/nonexistent/out.mp4"),
        );
        assert!(matches!(result, Err(MuxError::MissingInput(_))));
    }
}
