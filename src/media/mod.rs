//! Read-only media probing via ffprobe.

mod probe;

pub use probe::{
    probe_audio_codec, probe_duration_secs, probe_media_spec, probe_video_codec, ProbeError,
    ProbeResult,
};
