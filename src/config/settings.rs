//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level
//! updates.

use serde::{Deserialize, Serialize};

use crate::models::{NoiseColor, PrivacyStatus};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// External encoder/prober configuration.
    #[serde(default)]
    pub encoder: EncoderSettings,

    /// Noise synthesis configuration.
    #[serde(default)]
    pub noise: NoiseSettings,

    /// Upload platform configuration.
    #[serde(default)]
    pub upload: UploadSettings,

    /// Text-completion service configuration.
    #[serde(default)]
    pub text: TextSettings,

    /// Job queue behavior.
    #[serde(default)]
    pub jobs: JobSettings,
}

/// Path configuration for assets, work files, outputs, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root folder of the static source assets (category subfolders).
    #[serde(default = "default_asset_root")]
    pub asset_root: String,

    /// Root folder for per-run intermediate files.
    #[serde(default = "default_work_root")]
    pub work_root: String,

    /// Output folder for final videos.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,

    /// Folder for persisted channel token records.
    #[serde(default = "default_token_folder")]
    pub token_folder: String,
}

fn default_asset_root() -> String {
    "assets".to_string()
}

fn default_work_root() -> String {
    ".work".to_string()
}

fn default_output_folder() -> String {
    "outputs".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

fn default_token_folder() -> String {
    ".tokens".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            asset_root: default_asset_root(),
            work_root: default_work_root(),
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
            token_folder: default_token_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of recent lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Show timestamps in log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// External encoder and prober configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// Encoder binary.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,

    /// Prober binary.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,

    /// Encoder speed preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// CRF for the composition encode (18 = visually lossless).
    #[serde(default = "default_compose_crf")]
    pub compose_crf: u32,

    /// CRF for the size-budget encode.
    #[serde(default = "default_compress_crf")]
    pub compress_crf: u32,

    /// Chroma key color shared by all green-screen layers.
    #[serde(default = "default_key_color")]
    pub key_color: String,

    /// Chroma key similarity tolerance.
    #[serde(default = "default_key_similarity")]
    pub key_similarity: f64,

    /// Chroma key blend tolerance.
    #[serde(default = "default_key_blend")]
    pub key_blend: f64,

    /// Audio bitrate used when (re-)encoding audio, in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u64,

    /// Maximum seconds a single encoder invocation may run.
    #[serde(default = "default_encoder_timeout")]
    pub timeout_secs: u64,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_preset() -> String {
    "fast".to_string()
}

fn default_compose_crf() -> u32 {
    18
}

fn default_compress_crf() -> u32 {
    22
}

fn default_key_color() -> String {
    "0x00FF00".to_string()
}

fn default_key_similarity() -> f64 {
    0.2
}

fn default_key_blend() -> f64 {
    0.1
}

fn default_audio_bitrate() -> u64 {
    128
}

fn default_encoder_timeout() -> u64 {
    3600
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            preset: default_preset(),
            compose_crf: default_compose_crf(),
            compress_crf: default_compress_crf(),
            key_color: default_key_color(),
            key_similarity: default_key_similarity(),
            key_blend: default_key_blend(),
            audio_bitrate_kbps: default_audio_bitrate(),
            timeout_secs: default_encoder_timeout(),
        }
    }
}

/// Noise synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseSettings {
    /// Sample rate of generated tracks in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Base volume for generated tracks, clamped to [0.1, 1.0].
    #[serde(default = "default_track_volume")]
    pub track_volume: f64,

    /// Which colors are mixed into the soundtrack.
    #[serde(default = "default_mix_colors")]
    pub mix_colors: Vec<NoiseColor>,

    /// Post-mix gain applied after averaging.
    #[serde(default = "default_mix_gain")]
    pub mix_gain: f64,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_track_volume() -> f64 {
    0.5
}

fn default_mix_colors() -> Vec<NoiseColor> {
    vec![NoiseColor::Pink, NoiseColor::Brown]
}

fn default_mix_gain() -> f64 {
    1.2
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            track_volume: default_track_volume(),
            mix_colors: default_mix_colors(),
            mix_gain: default_mix_gain(),
        }
    }
}

/// Upload platform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Whether finished videos are uploaded.
    #[serde(default)]
    pub enabled: bool,

    /// Channel whose token record authorizes the upload.
    #[serde(default)]
    pub channel_id: String,

    /// OAuth client id for token refresh.
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret for token refresh.
    #[serde(default)]
    pub client_secret: String,

    /// Token refresh endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Resumable upload endpoint.
    #[serde(default = "default_upload_url")]
    pub upload_url: String,

    /// Data API base for thumbnails and playlists.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Upload chunk size in MB.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_mb: u64,

    /// Privacy status for new videos.
    #[serde(default)]
    pub privacy: PrivacyStatus,

    /// Platform category id (24 = Entertainment).
    #[serde(default = "default_category_id")]
    pub category_id: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum playlists fetched for fan-out.
    #[serde(default = "default_max_playlists")]
    pub max_playlists: u32,
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_upload_url() -> String {
    "https://www.googleapis.com/upload/youtube/v3/videos".to_string()
}

fn default_api_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_chunk_size() -> u64 {
    5
}

fn default_category_id() -> u32 {
    24
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_playlists() -> u32 {
    50
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            channel_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            token_url: default_token_url(),
            upload_url: default_upload_url(),
            api_url: default_api_url(),
            chunk_size_mb: default_chunk_size(),
            privacy: PrivacyStatus::default(),
            category_id: default_category_id(),
            request_timeout_secs: default_request_timeout(),
            max_playlists: default_max_playlists(),
        }
    }
}

/// Text-completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextSettings {
    /// Completion endpoint.
    #[serde(default = "default_text_endpoint")]
    pub endpoint: String,

    /// Model identifier.
    #[serde(default = "default_text_model")]
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds.
    #[serde(default = "default_text_timeout")]
    pub timeout_secs: u64,
}

fn default_text_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_text_model() -> String {
    "gpt-4.1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_text_timeout() -> u64 {
    30
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            endpoint: default_text_endpoint(),
            model: default_text_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_text_timeout(),
        }
    }
}

/// Job queue behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    /// Total attempts a job gets before being marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed backoff between attempts, in seconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    300
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_backoff_secs: default_retry_backoff(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Encoder,
    Noise,
    Upload,
    Text,
    Jobs,
}

impl ConfigSection {
    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Encoder => "encoder",
            ConfigSection::Noise => "noise",
            ConfigSection::Upload => "upload",
            ConfigSection::Text => "text",
            ConfigSection::Jobs => "jobs",
        }
    }
}
