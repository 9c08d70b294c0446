// Boundary facade for the moderation core.
//
// Everything the surrounding application touches goes through here:
// fire-and-forget submission screening, the synchronous preview check, and
// the admin resolution surface. Callers pass an authenticated principal
// explicitly; evaluating roles is the identity layer's job, enforcing them
// is ours.

use crate::core::classification::{ClassifierError, ScreeningService, Verdict};
use crate::core::content::ContentRef;
use crate::core::flags::{FlagError, FlagFilter, FlagPage, FlagRecord, FlagService};
use crate::core::notifications::{NotificationContext, NotificationEvent, NotificationService};
use crate::core::queue::{DeadLetter, JobQueue, NewJob, QueueError};
use crate::core::stats::{ModerationSummary, StatsService};
use std::sync::Arc;
use thiserror::Error;

/// Authenticated caller, resolved by the external identity layer.
#[derive(Debug, Clone, Copy)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FlagError> for ApiError {
    fn from(err: FlagError) -> Self {
        match err {
            FlagError::NotFound => ApiError::NotFound,
            FlagError::InvalidTransition => {
                ApiError::Conflict("flag is already resolved".to_string())
            }
            FlagError::AlreadyFlagged => {
                ApiError::Conflict("content is already flagged".to_string())
            }
            FlagError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            ClassifierError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

pub struct ModerationApi {
    queue: Arc<dyn JobQueue>,
    screening: Arc<ScreeningService>,
    flags: Arc<FlagService>,
    stats: Arc<StatsService>,
    notifications: Arc<NotificationService>,
}

impl ModerationApi {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        screening: Arc<ScreeningService>,
        flags: Arc<FlagService>,
        stats: Arc<StatsService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            queue,
            screening,
            flags,
            stats,
            notifications,
        }
    }

    /// Hand newly submitted content to the screening queue.
    ///
    /// Moderation is best-effort: when the queue is down the failure is
    /// logged and the content still publishes.
    pub async fn submit_content(&self, content: &ContentRef) {
        let job = NewJob {
            content_type: content.content_type,
            content_id: content.content_id,
            author_id: content.author_id,
            text: content.text.clone(),
        };

        match self.queue.enqueue(job).await {
            Ok(job_id) => {
                tracing::debug!(
                    job_id,
                    content_type = %content.content_type,
                    content_id = content.content_id,
                    "screening job enqueued"
                );
            }
            Err(err) => {
                tracing::error!(
                    content_type = %content.content_type,
                    content_id = content.content_id,
                    error = %err,
                    "failed to enqueue screening job, content published unscreened"
                );
            }
        }
    }

    /// Synchronous check used while composing content. Runs the same
    /// classifier and decision policy as the workers, but bypasses the
    /// queue and never records a flag.
    pub async fn preview_check(&self, text: &str) -> Result<Verdict, ApiError> {
        Ok(self.screening.screen(text).await?)
    }

    /// Flags raised on the caller's own content.
    pub async fn flagged_for_user(
        &self,
        principal: Principal,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, ApiError> {
        Ok(self
            .flags
            .flags_for_author(principal.user_id, page, limit)
            .await?)
    }

    pub async fn admin_list_flagged(
        &self,
        principal: Principal,
        filter: FlagFilter,
        page: u32,
        limit: u32,
    ) -> Result<FlagPage, ApiError> {
        self.require_admin(principal)?;
        Ok(self.flags.list_by_status(filter, page, limit).await?)
    }

    /// Uphold a flag. The content owner is notified once per successful
    /// transition; a retried approve fails with a conflict and does not
    /// re-notify.
    pub async fn admin_approve(
        &self,
        principal: Principal,
        flag_id: i64,
    ) -> Result<FlagRecord, ApiError> {
        self.require_admin(principal)?;
        let record = self.flags.approve(flag_id, principal.user_id).await?;
        self.notify_resolution(&record, NotificationEvent::Approved)
            .await;
        Ok(record)
    }

    /// Dismiss a flag, optionally with an explicit reason.
    pub async fn admin_reject(
        &self,
        principal: Principal,
        flag_id: i64,
        reason: Option<String>,
    ) -> Result<FlagRecord, ApiError> {
        self.require_admin(principal)?;
        let record = self
            .flags
            .reject(flag_id, principal.user_id, reason)
            .await?;
        self.notify_resolution(&record, NotificationEvent::Rejected)
            .await;
        Ok(record)
    }

    pub async fn admin_stats(&self, principal: Principal) -> Result<ModerationSummary, ApiError> {
        self.require_admin(principal)?;
        Ok(self.stats.summary().await?)
    }

    pub async fn admin_dead_letters(
        &self,
        principal: Principal,
        limit: u32,
    ) -> Result<Vec<DeadLetter>, ApiError> {
        self.require_admin(principal)?;
        Ok(self.queue.list_dead_letters(limit).await?)
    }

    fn require_admin(&self, principal: Principal) -> Result<(), ApiError> {
        if principal.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }

    async fn notify_resolution(&self, record: &FlagRecord, event: NotificationEvent) {
        let ctx = NotificationContext {
            content_type: record.content_type,
            content_id: record.content_id,
            reason: Some(record.reason.clone()),
            rejection_reason: record.rejection_reason.clone(),
        };

        if let Err(err) = self
            .notifications
            .notify(record.author_id, event, ctx)
            .await
        {
            // Delivery problems are an observability concern, not the
            // admin's; the transition stands either way.
            tracing::warn!(flag_id = record.id, error = %err, "resolution notification failed");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
