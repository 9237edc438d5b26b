//! Per-run logging: file output, optional callback, tail buffer.

mod run_logger;
mod types;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use std::path::Path;

/// Initialize global tracing for library-level diagnostics.
///
/// Writes daily-rotated files under `log_dir` in addition to stderr.
/// Per-run pipeline output goes through [`RunLogger`] instead.
pub fn init_tracing(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let file_appender = tracing_appender::rolling::daily(log_dir, "hushloop.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    guard
}
