use super::queue_models::{DeadLetter, JobOutcome, ModerationJob, NewJob};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

/// Durable job intake for the moderation pipeline.
///
/// Enqueue is fire-and-forget from the producer's point of view: content
/// publication never waits for (or depends on) screening.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Durably record a job and return immediately.
    async fn enqueue(&self, job: NewJob) -> Result<i64, QueueError>;

    /// Claim the oldest available job, moving it QUEUED -> PROCESSING.
    /// No two workers can claim the same job.
    async fn claim_next(&self) -> Result<Option<ModerationJob>, QueueError>;

    /// Discard a job that reached a terminal outcome.
    async fn complete(&self, job_id: i64, outcome: JobOutcome) -> Result<(), QueueError>;

    /// Put a claimed job back with an updated attempt counter; it becomes
    /// visible again after `delay`.
    async fn retry_later(
        &self,
        job_id: i64,
        attempt: u32,
        delay: Duration,
    ) -> Result<(), QueueError>;

    /// Un-claim a job without consuming an attempt (used when another
    /// worker already holds the same content).
    async fn release(&self, job_id: i64, delay: Duration) -> Result<(), QueueError>;

    /// Park a job that exhausted its retries.
    async fn dead_letter(&self, job_id: i64, error: &str) -> Result<(), QueueError>;

    /// Most recently dead-lettered jobs, newest first.
    async fn list_dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, QueueError>;
}
