//! Job queue: typed entries with JSON persistence.

mod queue;
mod types;

pub use queue::JobQueue;
pub use types::{JobQueueEntry, JobQueueStatus};
