use crate::core::content::ContentType;
use chrono::{DateTime, Utc};

/// Payload recorded when content is submitted for screening.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub text: String,
}

/// A queued screening job as handed to a worker.
#[derive(Debug, Clone)]
pub struct ModerationJob {
    pub job_id: i64,
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub text: String,
    pub enqueued_at: DateTime<Utc>,
    /// Processing attempts already spent on this job.
    pub attempt: u32,
}

/// Terminal outcome of a processed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// A flag record exists for the content (created now or previously).
    Flagged,
    /// Content was clean, deleted, or unanalyzable - nothing to do.
    Cleared,
}

/// A job that exhausted its retries, held for inspection.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub job_id: i64,
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub error: String,
    pub dead_lettered_at: DateTime<Utc>,
}
