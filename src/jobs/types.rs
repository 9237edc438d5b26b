//! Job queue entry types.

use serde::{Deserialize, Serialize};

use crate::models::DurationProfile;

/// Status of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobQueueStatus {
    /// Waiting for the worker.
    Pending,
    /// Currently being processed.
    Running,
    /// Finished successfully.
    Completed,
    /// Failed after exhausting its attempts.
    Failed,
}

/// One queued video production job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobQueueEntry {
    /// Unique job identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Pipeline variant to produce.
    pub profile: DurationProfile,
    /// Current status.
    pub status: JobQueueStatus,
    /// Error message from the last failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the job was enqueued.
    pub created_at: String,
}

impl JobQueueEntry {
    /// Create a new pending entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>, profile: DurationProfile) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profile,
            status: JobQueueStatus::Pending,
            error_message: None,
            created_at: chrono::Local::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_pending() {
        let entry = JobQueueEntry::new("j1", "overnight batch", DurationProfile::long_form(10));
        assert_eq!(entry.status, JobQueueStatus::Pending);
        assert!(entry.error_message.is_none());
    }

    #[test]
    fn entry_round_trips_through_json() {
        let entry = JobQueueEntry::new("j2", "short", DurationProfile::short_form());
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: JobQueueEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "j2");
        assert_eq!(parsed.profile.name, "short");
        assert_eq!(parsed.status, JobQueueStatus::Pending);
    }
}
