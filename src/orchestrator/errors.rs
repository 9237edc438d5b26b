//! Error types for the orchestrator pipeline.
//!
//! Errors carry context that chains through layers:
//! Job → Step → Operation → Detail

use std::io;

use thiserror::Error;

use crate::assets::AssetError;
use crate::compose::ComposeError;
use crate::compress::CompressError;
use crate::expand::ExpandError;
use crate::media::ProbeError;
use crate::mux::MuxError;
use crate::noise::NoiseError;
use crate::upload::{TokenError, UploadError};

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed during execution.
    #[error("Run '{run_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_id: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Failed to set up the run (create directories, etc.).
    #[error("Run '{run_id}' setup failed: {message}")]
    SetupFailed { run_id: String, message: String },
}

impl PipelineError {
    /// Create a step failed error.
    pub fn step_failed(
        run_id: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_id: run_id.into(),
            step_name: step_name.into(),
            source,
        }
    }

    /// Create a setup failed error.
    pub fn setup_failed(run_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            run_id: run_id.into(),
            message: message.into(),
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    /// Output validation failed.
    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An external tool failed.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// A required file was not found.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// File I/O error.
    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A precondition was not met.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),

    /// A network/platform operation failed. Eligible for whole-job retry.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Generic step error with message.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an invalid output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a precondition failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<AssetError> for StepError {
    fn from(e: AssetError) -> Self {
        match e {
            AssetError::NotFound { path } => Self::FileNotFound {
                path: path.display().to_string(),
            },
            other => Self::PreconditionFailed(other.to_string()),
        }
    }
}

impl From<ProbeError> for StepError {
    fn from(e: ProbeError) -> Self {
        match e {
            ProbeError::FileNotFound(path) => Self::FileNotFound {
                path: path.display().to_string(),
            },
            ProbeError::CommandFailed {
                tool,
                exit_code,
                message,
            } => Self::CommandFailed {
                tool,
                exit_code,
                message,
            },
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<ComposeError> for StepError {
    fn from(e: ComposeError) -> Self {
        match e {
            ComposeError::EncoderFailed { exit_code, stderr } => {
                Self::command_failed("ffmpeg", exit_code, stderr)
            }
            ComposeError::OutputMissing(path) => Self::InvalidOutput(path.display().to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<NoiseError> for StepError {
    fn from(e: NoiseError) -> Self {
        match e {
            NoiseError::GenerationFailed { exit_code, stderr }
            | NoiseError::MixFailed { exit_code, stderr } => {
                Self::command_failed("ffmpeg", exit_code, stderr)
            }
            NoiseError::MissingTrack(path) | NoiseError::EmptyOutput(path) => {
                Self::PreconditionFailed(path.display().to_string())
            }
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<MuxError> for StepError {
    fn from(e: MuxError) -> Self {
        match e {
            MuxError::MissingInput(path) => Self::FileNotFound {
                path: path.display().to_string(),
            },
            MuxError::MergeFailed { exit_code, stderr } => {
                Self::command_failed("ffmpeg", exit_code, stderr)
            }
            MuxError::Probe(p) => p.into(),
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<CompressError> for StepError {
    fn from(e: CompressError) -> Self {
        match e {
            CompressError::MissingInput(path) => Self::FileNotFound {
                path: path.display().to_string(),
            },
            CompressError::EncoderFailed { exit_code, stderr } => {
                Self::command_failed("ffmpeg", exit_code, stderr)
            }
            CompressError::Probe(p) => p.into(),
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<ExpandError> for StepError {
    fn from(e: ExpandError) -> Self {
        match e {
            ExpandError::Probe(p) => p.into(),
            ExpandError::ConformFailed { exit_code, stderr }
            | ExpandError::ConcatFailed { exit_code, stderr } => {
                Self::command_failed("ffmpeg", exit_code, stderr)
            }
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<UploadError> for StepError {
    fn from(e: UploadError) -> Self {
        Self::UploadFailed(e.to_string())
    }
}

impl From<TokenError> for StepError {
    fn from(e: TokenError) -> Self {
        Self::UploadFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn step_error_displays_context() {
        let err = StepError::command_failed("ffmpeg", 1, "filter parse error");
        let msg = err.to_string();
        assert!(msg.contains("ffmpeg"));
        assert!(msg.contains("exit code 1"));
        assert!(msg.contains("filter parse error"));
    }

    #[test]
    fn pipeline_error_chains_context() {
        let step_err = StepError::file_not_found("/assets/backgrounds/3.mp4");
        let pipeline_err = PipelineError::step_failed("run_123", "Compose", step_err);

        let msg = pipeline_err.to_string();
        assert!(msg.contains("run_123"));
        assert!(msg.contains("Compose"));
    }

    #[test]
    fn asset_not_found_names_path() {
        let err: StepError = AssetError::NotFound {
            path: PathBuf::from("/assets/effects/5_1min.mp4"),
        }
        .into();

        assert!(err.to_string().contains("/assets/effects/5_1min.mp4"));
    }

    #[test]
    fn probe_failure_maps_to_command_failed() {
        let err: StepError = ProbeError::CommandFailed {
            tool: "ffprobe".to_string(),
            exit_code: 1,
            message: "invalid data".to_string(),
        }
        .into();

        assert!(matches!(err, StepError::CommandFailed { .. }));
    }
}
