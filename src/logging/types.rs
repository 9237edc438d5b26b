//! Logging types and configuration.

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// General information.
    #[default]
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}

/// Configuration for per-run logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to output.
    pub level: LogLevel,
    /// Use compact mode (tool output only buffered, shown on error).
    pub compact: bool,
    /// Number of recent tool-output lines kept for error diagnosis.
    pub error_tail: usize,
    /// Show timestamps in log output.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: 20,
            show_timestamps: true,
        }
    }
}

impl LogConfig {
    /// Create a debug configuration (verbose, no compact filtering).
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            error_tail: 50,
            show_timestamps: true,
        }
    }

    /// Build a config from settings.
    pub fn from_settings(logging: &crate::config::LoggingSettings) -> Self {
        Self {
            level: LogLevel::Info,
            compact: logging.compact,
            error_tail: logging.error_tail as usize,
            show_timestamps: logging.show_timestamps,
        }
    }
}

/// Callback receiving each formatted log line (queue status display, tests).
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Message prefix types for consistent formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePrefix {
    /// Shell command: `$ command`
    Command,
    /// Phase marker: `=== Phase ===`
    Phase,
    /// Success: `[SUCCESS]`
    Success,
    /// Warning: `[WARNING]`
    Warning,
    /// Error: `[ERROR]`
    Error,
    /// No prefix
    None,
}

impl MessagePrefix {
    /// Format a message with this prefix.
    pub fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Success => format!("[SUCCESS] {}", message),
            MessagePrefix::Warning => format!("[WARNING] {}", message),
            MessagePrefix::Error => format!("[ERROR] {}", message),
            MessagePrefix::None => message.to_string(),
        }
    }
}
