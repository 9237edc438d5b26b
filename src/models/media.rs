//! Probed stream properties of a media file.

use serde::{Deserialize, Serialize};

/// Video and audio stream properties probed from a reference file.
///
/// Stream-copy concatenation requires byte-compatible streams across all
/// segments, so any clip joined to a base clip must first be conformed to
/// the base clip's spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSpec {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub frame_rate: f64,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Audio channel count.
    pub channel_count: u8,
}

impl MediaSpec {
    /// Check whether another spec can be stream-copy concatenated with this one.
    pub fn concat_compatible(&self, other: &MediaSpec) -> bool {
        self.width == other.width
            && self.height == other.height
            && (self.frame_rate - other.frame_rate).abs() < 0.01
            && self.sample_rate == other.sample_rate
            && self.channel_count == other.channel_count
    }

    /// Format the frame rate for an encoder filter argument.
    ///
    /// Whole rates render without a fractional part (`25`, not `25.000`).
    pub fn frame_rate_arg(&self) -> String {
        if (self.frame_rate - self.frame_rate.round()).abs() < 1e-6 {
            format!("{}", self.frame_rate.round() as u64)
        } else {
            format!("{:.3}", self.frame_rate)
        }
    }
}

impl std::fmt::Display for MediaSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}@{} fps, {} Hz {}ch",
            self.width, self.height, self.frame_rate_arg(), self.sample_rate, self.channel_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(w: u32, h: u32, fps: f64) -> MediaSpec {
        MediaSpec {
            width: w,
            height: h,
            frame_rate: fps,
            sample_rate: 44100,
            channel_count: 2,
        }
    }

    #[test]
    fn identical_specs_are_compatible() {
        assert!(spec(1280, 720, 25.0).concat_compatible(&spec(1280, 720, 25.0)));
    }

    #[test]
    fn resolution_mismatch_is_incompatible() {
        assert!(!spec(1920, 1080, 30.0).concat_compatible(&spec(1280, 720, 25.0)));
    }

    #[test]
    fn frame_rate_arg_drops_trailing_zeroes() {
        assert_eq!(spec(1280, 720, 25.0).frame_rate_arg(), "25");
        assert_eq!(spec(1280, 720, 23.976).frame_rate_arg(), "23.976");
    }
}
