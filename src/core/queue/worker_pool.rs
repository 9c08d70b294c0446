// Worker pool for the moderation queue.
//
// Each worker claims jobs, runs the classifier + decision engine, and
// records flags for toxic verdicts. Transient classifier failures are
// retried with exponential backoff by putting the job back on the queue;
// jobs that exhaust their retries are dead-lettered and the content stays
// published (fail-open).

use super::job_queue::{JobQueue, QueueError};
use super::queue_models::{JobOutcome, ModerationJob};
use crate::core::classification::{ClassifierError, ScreeningService};
use crate::core::content::{ContentGate, ContentType};
use crate::core::flags::{FlagError, FlagService, NewFlag};
use crate::core::notifications::{NotificationContext, NotificationEvent, NotificationService};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent worker tasks.
    pub workers: usize,
    /// Maximum processing attempts per job before dead-lettering.
    pub max_attempts: u32,
    /// Base delay for exponential retry backoff.
    pub retry_base: Duration,
    /// Upper bound of the random jitter added to each retry delay.
    pub retry_jitter: Duration,
    /// How long an idle worker sleeps before polling the queue again.
    pub poll_interval: Duration,
    /// Visibility delay for a job released because its content is already
    /// being processed by another worker.
    pub busy_release_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_attempts: 5,
            retry_base: Duration::from_secs(2),
            retry_jitter: Duration::from_millis(500),
            poll_interval: Duration::from_millis(500),
            busy_release_delay: Duration::from_millis(250),
        }
    }
}

pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    screening: Arc<ScreeningService>,
    flags: Arc<FlagService>,
    gate: Arc<dyn ContentGate>,
    notifications: Arc<NotificationService>,
    config: WorkerConfig,
    /// Content currently being processed. Serializes work per content item
    /// so the at-most-one-flag invariant holds under concurrent workers.
    in_flight: DashMap<(ContentType, i64), ()>,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        screening: Arc<ScreeningService>,
        flags: Arc<FlagService>,
        gate: Arc<dyn ContentGate>,
        notifications: Arc<NotificationService>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            screening,
            flags,
            gate,
            notifications,
            config,
            in_flight: DashMap::new(),
        }
    }

    /// Spawn the configured number of worker tasks. They run until the
    /// returned handles are aborted.
    pub fn spawn(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        (0..self.config.workers)
            .map(|worker_id| {
                let pool = Arc::clone(&self);
                tokio::spawn(async move {
                    tracing::info!(worker_id, "moderation worker started");
                    loop {
                        match pool.run_once().await {
                            Ok(true) => {}
                            Ok(false) => tokio::time::sleep(pool.config.poll_interval).await,
                            Err(err) => {
                                tracing::warn!(worker_id, error = %err, "queue poll failed");
                                tokio::time::sleep(pool.config.poll_interval).await;
                            }
                        }
                    }
                })
            })
            .collect()
    }

    /// Claim and process at most one job. Returns whether a job was claimed.
    pub async fn run_once(&self) -> Result<bool, QueueError> {
        let Some(job) = self.queue.claim_next().await? else {
            return Ok(false);
        };

        let key = (job.content_type, job.content_id);
        match self.in_flight.entry(key) {
            Entry::Occupied(_) => {
                // Another worker holds this content right now; hand the job
                // back and let it become visible again shortly.
                self.queue
                    .release(job.job_id, self.config.busy_release_delay)
                    .await?;
                return Ok(true);
            }
            Entry::Vacant(entry) => {
                entry.insert(());
            }
        }

        let result = self.process(job).await;
        self.in_flight.remove(&key);
        result?;
        Ok(true)
    }

    async fn process(&self, job: ModerationJob) -> Result<(), QueueError> {
        let attempt = job.attempt + 1;
        tracing::debug!(
            job_id = job.job_id,
            content_id = job.content_id,
            attempt,
            "processing moderation job"
        );

        // Content deleted while the job sat in the queue? Nothing to screen.
        match self.gate.exists(job.content_type, job.content_id).await {
            Ok(false) => {
                tracing::debug!(job_id = job.job_id, "content gone, clearing job");
                return self.queue.complete(job.job_id, JobOutcome::Cleared).await;
            }
            Ok(true) => {}
            Err(err) => {
                // A broken gate must not stall screening.
                tracing::warn!(job_id = job.job_id, error = %err, "content gate check failed");
            }
        }

        let verdict = match self.screening.screen(&job.text).await {
            Ok(verdict) => verdict,
            Err(err @ ClassifierError::Unavailable(_)) => {
                return self.handle_transient_failure(&job, attempt, &err.to_string()).await;
            }
            Err(err) => {
                // Nothing analyzable (empty or oversized text). Fail open.
                tracing::warn!(job_id = job.job_id, error = %err, "screening rejected input, clearing job");
                return self.queue.complete(job.job_id, JobOutcome::Cleared).await;
            }
        };

        if !verdict.is_toxic {
            return self.queue.complete(job.job_id, JobOutcome::Cleared).await;
        }

        let reason = verdict.reason.unwrap_or_else(|| "Flagged".to_string());
        match self
            .flags
            .create_flag(NewFlag {
                content_type: job.content_type,
                content_id: job.content_id,
                author_id: job.author_id,
                reason,
            })
            .await
        {
            Ok(record) => {
                let ctx = NotificationContext {
                    content_type: record.content_type,
                    content_id: record.content_id,
                    reason: Some(record.reason.clone()),
                    rejection_reason: None,
                };
                if let Err(err) = self
                    .notifications
                    .notify(record.author_id, NotificationEvent::Flagged, ctx)
                    .await
                {
                    tracing::warn!(flag_id = record.id, error = %err, "flag notification failed");
                }
            }
            Err(FlagError::AlreadyFlagged) => {
                // Duplicate enqueue of the same content; the earlier flag
                // stands and this job is discarded silently.
                tracing::debug!(
                    job_id = job.job_id,
                    content_id = job.content_id,
                    "content already flagged, discarding job"
                );
            }
            Err(err) => {
                tracing::error!(job_id = job.job_id, error = %err, "failed to record flag");
                return self.handle_transient_failure(&job, attempt, &err.to_string()).await;
            }
        }

        self.queue.complete(job.job_id, JobOutcome::Flagged).await
    }

    async fn handle_transient_failure(
        &self,
        job: &ModerationJob,
        attempt: u32,
        error: &str,
    ) -> Result<(), QueueError> {
        if attempt >= self.config.max_attempts {
            tracing::error!(
                job_id = job.job_id,
                content_type = %job.content_type,
                content_id = job.content_id,
                attempts = attempt,
                error,
                "retries exhausted, dead-lettering job"
            );
            return self.queue.dead_letter(job.job_id, error).await;
        }

        let delay = self.retry_delay(attempt);
        tracing::warn!(
            job_id = job.job_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error,
            "transient failure, retrying"
        );
        self.queue.retry_later(job.job_id, attempt, delay).await
    }

    /// Exponential backoff with jitter: base * 2^(attempt-1) + rand.
    fn retry_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(10);
        let base = self.config.retry_base.saturating_mul(1u32 << exp);
        let jitter_max = self.config.retry_jitter.as_millis() as u64;
        let jitter = if jitter_max == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_max)
        };
        base + Duration::from_millis(jitter)
    }
}

// ============================================================================
// TESTS
// ============================================================================
