//! Job runner: one job at a time, whole-job retry with fixed backoff.
//!
//! There is no retry inside the pipeline; when any stage fails, the
//! enclosing job is retried as a whole, up to the configured attempt
//! count. Every attempt gets a fresh run id and a fresh namespaced work
//! directory, so a crashed attempt can never corrupt the next one.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use rand::Rng;

use crate::config::Settings;
use crate::jobs::{JobQueue, JobQueueEntry, JobQueueStatus};
use crate::logging::{LogCallback, LogConfig, RunLogger};

use super::create_standard_pipeline;
use super::types::{RunContext, RunState};

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Job ID that was processed.
    pub job_id: String,
    /// Whether the job completed successfully.
    pub success: bool,
    /// Path to the final video (if successful).
    pub output_path: Option<PathBuf>,
    /// Error message from the last attempt (if failed).
    pub error: Option<String>,
    /// Attempts consumed.
    pub attempts: u32,
}

/// Single-worker processor for queued jobs.
pub struct JobRunner {
    settings: Settings,
}

impl JobRunner {
    /// Create a runner over the given settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Run one job to completion or final failure.
    ///
    /// Retries the whole job with a fixed backoff between attempts.
    pub fn run_job(
        &self,
        entry: &JobQueueEntry,
        mut log_callback: Option<LogCallback>,
    ) -> JobResult {
        let max_attempts = self.settings.jobs.max_attempts.max(1);
        let backoff = Duration::from_secs(self.settings.jobs.retry_backoff_secs);

        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            tracing::info!(job = %entry.id, attempt, max_attempts, "starting job attempt");

            match self.run_attempt(entry, attempt, log_callback.take()) {
                Ok(output_path) => {
                    return JobResult {
                        job_id: entry.id.clone(),
                        success: true,
                        output_path: Some(output_path),
                        error: None,
                        attempts: attempt,
                    };
                }
                Err(e) => {
                    tracing::error!(job = %entry.id, attempt, "attempt failed: {}", e);
                    last_error = e;

                    if attempt < max_attempts {
                        tracing::info!(
                            backoff_secs = backoff.as_secs(),
                            "backing off before retry"
                        );
                        thread::sleep(backoff);
                    }
                }
            }
        }

        JobResult {
            job_id: entry.id.clone(),
            success: false,
            output_path: None,
            error: Some(last_error),
            attempts: max_attempts,
        }
    }

    /// Run one pipeline attempt end-to-end.
    fn run_attempt(
        &self,
        entry: &JobQueueEntry,
        attempt: u32,
        log_callback: Option<LogCallback>,
    ) -> Result<PathBuf, String> {
        let run_id = new_run_id(&entry.id, attempt);

        let work_dir = PathBuf::from(&self.settings.paths.work_root).join(&run_id);
        fs::create_dir_all(&work_dir)
            .map_err(|e| format!("failed to create work directory: {}", e))?;

        let output_dir = PathBuf::from(&self.settings.paths.output_folder);
        fs::create_dir_all(&output_dir)
            .map_err(|e| format!("failed to create output directory: {}", e))?;

        let logger = RunLogger::new(
            &run_id,
            &self.settings.paths.logs_folder,
            LogConfig::from_settings(&self.settings.logging),
            log_callback,
        )
        .map_err(|e| format!("failed to create run logger: {}", e))?;

        let ctx = RunContext::new(
            entry.profile.clone(),
            self.settings.clone(),
            &run_id,
            work_dir.clone(),
            output_dir,
            Arc::new(logger),
        );

        ctx.logger.info(&format!(
            "profile {} targeting {}s",
            ctx.profile.name, ctx.target_duration_seconds
        ));

        let mut state = RunState::new(&run_id);
        let pipeline = create_standard_pipeline();
        let run_result = pipeline.run(&ctx, &mut state).map_err(|e| e.to_string());

        // The namespaced work directory holds only consumed or orphaned
        // intermediates at this point; nothing in it outlives the run.
        if let Err(e) = fs::remove_dir_all(&work_dir) {
            tracing::warn!(dir = %work_dir.display(), "failed to remove work dir: {}", e);
        }

        run_result?;

        state
            .final_output()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| "pipeline completed without a final output".to_string())
    }

    /// Process every pending job in the queue, one at a time.
    pub fn process_queue(&self, queue: &mut JobQueue) -> Vec<JobResult> {
        let mut results = Vec::new();

        while let Some(index) = queue.next_pending() {
            let entry = queue.get(index).expect("index from next_pending").clone();
            queue.set_status(index, JobQueueStatus::Running);
            let _ = queue.save();

            tracing::info!(job = %entry.id, name = %entry.name, "processing job");
            let result = self.run_job(&entry, None);

            if result.success {
                queue.set_status(index, JobQueueStatus::Completed);
            } else {
                queue.set_error(
                    index,
                    result.error.clone().unwrap_or_else(|| "unknown".to_string()),
                );
            }
            let _ = queue.save();

            results.push(result);
        }

        results
    }
}

/// Build a unique run id from the job id, a timestamp, and a random tag.
fn new_run_id(job_id: &str, attempt: u32) -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let tag: u32 = rand::thread_rng().gen_range(0x1000..0xFFFF);
    format!("{}_{}_a{}_{:x}", job_id, stamp, attempt, tag)
}
