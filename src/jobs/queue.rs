//! Job queue state management with persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::{JobQueueEntry, JobQueueStatus};

/// Persistent queue state (saved to queue.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueState {
    /// Queue format version.
    version: u32,
    /// Jobs in queue order.
    jobs: Vec<JobQueueEntry>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self {
            version: 1,
            jobs: Vec::new(),
        }
    }
}

/// In-memory job queue with persistence to a state folder.
#[derive(Debug)]
pub struct JobQueue {
    /// Jobs in queue order.
    jobs: Vec<JobQueueEntry>,
    /// Path to queue.json for persistence.
    queue_file: PathBuf,
}

impl JobQueue {
    /// Create a queue with persistence in the given folder.
    ///
    /// Loads existing state when queue.json is present. Jobs that were
    /// mid-run when the process died go back to pending.
    pub fn new(state_folder: &Path) -> Self {
        let queue_file = state_folder.join("queue.json");

        let mut jobs = if queue_file.exists() {
            match fs::read_to_string(&queue_file) {
                Ok(content) => match serde_json::from_str::<QueueState>(&content) {
                    Ok(state) => {
                        tracing::info!("Loaded {} jobs from queue.json", state.jobs.len());
                        state.jobs
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse queue.json: {}", e);
                        Vec::new()
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read queue.json: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        for job in &mut jobs {
            if job.status == JobQueueStatus::Running {
                job.status = JobQueueStatus::Pending;
            }
        }

        Self { jobs, queue_file }
    }

    /// Create a queue without persistence (for testing).
    pub fn in_memory() -> Self {
        Self {
            jobs: Vec::new(),
            queue_file: PathBuf::new(),
        }
    }

    /// Persist queue to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if self.queue_file.as_os_str().is_empty() {
            return Ok(()); // In-memory queue, nothing to save
        }

        if let Some(parent) = self.queue_file.parent() {
            fs::create_dir_all(parent)?;
        }

        let state = QueueState {
            version: 1,
            jobs: self.jobs.clone(),
        };

        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        // Write atomically via temp file
        let temp_file = self.queue_file.with_extension("json.tmp");
        fs::write(&temp_file, &json)?;
        fs::rename(&temp_file, &self.queue_file)?;

        tracing::debug!("Saved {} jobs to queue.json", self.jobs.len());
        Ok(())
    }

    /// Get all jobs.
    pub fn jobs(&self) -> &[JobQueueEntry] {
        &self.jobs
    }

    /// Get a job by index.
    pub fn get(&self, index: usize) -> Option<&JobQueueEntry> {
        self.jobs.get(index)
    }

    /// Get a job by ID.
    pub fn get_by_id(&self, id: &str) -> Option<&JobQueueEntry> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Number of jobs in queue.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if queue is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Add a job to the queue.
    pub fn add(&mut self, job: JobQueueEntry) {
        self.jobs.push(job);
    }

    /// Remove a job by index.
    pub fn remove(&mut self, index: usize) -> Option<JobQueueEntry> {
        if index < self.jobs.len() {
            Some(self.jobs.remove(index))
        } else {
            None
        }
    }

    /// Index of the first pending job, if any.
    pub fn next_pending(&self) -> Option<usize> {
        self.jobs
            .iter()
            .position(|j| j.status == JobQueueStatus::Pending)
    }

    /// Update job status.
    pub fn set_status(&mut self, index: usize, status: JobQueueStatus) {
        if let Some(job) = self.jobs.get_mut(index) {
            job.status = status;
            if status != JobQueueStatus::Failed {
                job.error_message = None;
            }
        }
    }

    /// Mark job as failed with error message.
    pub fn set_error(&mut self, index: usize, error: String) {
        if let Some(job) = self.jobs.get_mut(index) {
            job.status = JobQueueStatus::Failed;
            job.error_message = Some(error);
        }
    }

    /// Clear the queue.
    pub fn clear(&mut self) {
        self.jobs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DurationProfile;
    use tempfile::tempdir;

    fn make_job(id: &str) -> JobQueueEntry {
        JobQueueEntry::new(id, format!("Job {}", id), DurationProfile::long_form(1))
    }

    #[test]
    fn queue_add_remove() {
        let mut queue = JobQueue::in_memory();
        queue.add(make_job("1"));
        queue.add(make_job("2"));

        assert_eq!(queue.len(), 2);

        queue.remove(0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(0).unwrap().id, "2");
    }

    #[test]
    fn next_pending_skips_finished_jobs() {
        let mut queue = JobQueue::in_memory();
        queue.add(make_job("1"));
        queue.add(make_job("2"));

        queue.set_status(0, JobQueueStatus::Completed);
        assert_eq!(queue.next_pending(), Some(1));

        queue.set_error(1, "boom".to_string());
        assert_eq!(queue.next_pending(), None);
    }

    #[test]
    fn queue_persists_and_reloads() {
        let dir = tempdir().unwrap();

        {
            let mut queue = JobQueue::new(dir.path());
            queue.add(make_job("1"));
            queue.add(make_job("2"));
            queue.set_status(0, JobQueueStatus::Completed);
            queue.save().unwrap();
        }

        let reloaded = JobQueue::new(dir.path());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(0).unwrap().status, JobQueueStatus::Completed);
        assert_eq!(reloaded.get_by_id("2").unwrap().status, JobQueueStatus::Pending);
    }

    #[test]
    fn interrupted_running_jobs_reset_to_pending() {
        let dir = tempdir().unwrap();

        {
            let mut queue = JobQueue::new(dir.path());
            queue.add(make_job("1"));
            queue.set_status(0, JobQueueStatus::Running);
            queue.save().unwrap();
        }

        let reloaded = JobQueue::new(dir.path());
        assert_eq!(reloaded.get(0).unwrap().status, JobQueueStatus::Pending);
    }
}
