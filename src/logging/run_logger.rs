//! Per-run logger with file and callback output.
//!
//! Each pipeline run gets its own logger that:
//! - Writes to a dedicated log file
//! - Sends messages to an optional callback
//! - Maintains a tail buffer of tool output for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Per-run logger with dual output (file + callback).
pub struct RunLogger {
    /// Run identifier (used in log filename).
    run_id: String,
    /// Path to log file.
    log_path: PathBuf,
    /// File writer (buffered).
    file_writer: Arc<Mutex<Option<BufWriter<File>>>>,
    /// Optional callback for forwarding lines.
    callback: Arc<Mutex<Option<LogCallback>>>,
    /// Logging configuration.
    config: LogConfig,
    /// Tail buffer of recent tool output lines.
    tail_buffer: Arc<Mutex<VecDeque<String>>>,
}

impl RunLogger {
    /// Create a new run logger writing to `log_dir/<run_id>.log`.
    pub fn new(
        run_id: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let run_id = run_id.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&run_id)));
        let file = File::create(&log_path)?;

        Ok(Self {
            run_id,
            log_path,
            file_writer: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
            callback: Arc::new(Mutex::new(callback)),
            config,
            tail_buffer: Arc::new(Mutex::new(VecDeque::with_capacity(100))),
        })
    }

    /// Get the run identifier.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the log file path.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    /// Log an info message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a debug message.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log a warning message.
    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    /// Log an error message.
    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a success message.
    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Record a tool output line.
    ///
    /// Always lands in the tail buffer; in compact mode it is not echoed
    /// to the log until `show_tail` is called after an error.
    pub fn output_line(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }

        if self.config.compact {
            return;
        }

        self.output(&self.format_message(line));
    }

    /// Show the tail buffer (typically after an error).
    pub fn show_tail(&self, header: &str) {
        let buffer = self.tail_buffer.lock();
        if buffer.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in buffer.iter() {
            self.output(&self.format_message(line));
        }
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the logger and release resources.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    /// Format a message with timestamp (if enabled).
    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    /// Output a formatted message to file and callback.
    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref callback) = *self.callback.lock() {
            callback(formatted);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sanitize a string to be safe for use as a filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn creates_log_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("run_abc", dir.path(), LogConfig::default(), None).unwrap();

        assert!(logger.log_path().exists());
        assert!(logger.log_path().to_string_lossy().contains("run_abc.log"));
    }

    #[test]
    fn writes_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("run_abc", dir.path(), LogConfig::default(), None).unwrap();

        logger.info("Test message");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("Test message"));
    }

    #[test]
    fn calls_callback() {
        let dir = tempdir().unwrap();
        let call_count = Arc::new(AtomicUsize::new(0));
        let count_clone = call_count.clone();

        let callback: LogCallback = Box::new(move |_msg| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger =
            RunLogger::new("run_abc", dir.path(), LogConfig::default(), Some(callback)).unwrap();

        logger.info("Message 1");
        logger.info("Message 2");

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tail_buffer_maintains_limit() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 5,
            ..LogConfig::default()
        };

        let logger = RunLogger::new("run_abc", dir.path(), config, None).unwrap();

        for i in 0..10 {
            logger.output_line(&format!("Line {}", i));
        }

        let tail = logger.get_tail();
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], "Line 5");
        assert_eq!(tail[4], "Line 9");
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
