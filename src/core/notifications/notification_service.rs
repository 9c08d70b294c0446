// Notification dispatcher - best-effort, at-least-once email delivery.
//
// Delivery never participates in any invariant: a failed send is logged
// and surfaced to observability, and must not roll back the state
// transition that triggered it. Owners may occasionally receive the same
// notification twice; notifications are informational only.

use super::notification_models::{
    NotificationContext, NotificationEvent, NotificationPrefs, NotifyOutcome,
};
use crate::core::content::ContentType;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Send failed: {0}")]
    Send(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Outbound email capability.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Read side of per-user notification preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: i64) -> Result<Option<NotificationPrefs>, NotifyError>;
}

pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    prefs: Arc<dyn PreferenceStore>,
    max_send_attempts: u32,
    send_retry_delay: Duration,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, prefs: Arc<dyn PreferenceStore>) -> Self {
        Self {
            mailer,
            prefs,
            max_send_attempts: 3,
            send_retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retry(mut self, max_send_attempts: u32, send_retry_delay: Duration) -> Self {
        self.max_send_attempts = max_send_attempts.max(1);
        self.send_retry_delay = send_retry_delay;
        self
    }

    /// Notify a content owner about a flag event.
    ///
    /// Opted-out users produce a `Skipped` outcome, not an error. Transient
    /// send failures are retried up to `max_send_attempts` times.
    pub async fn notify(
        &self,
        user_id: i64,
        event: NotificationEvent,
        ctx: NotificationContext,
    ) -> Result<NotifyOutcome, NotifyError> {
        let prefs = match self.prefs.get(user_id).await? {
            Some(prefs) if prefs.email_enabled && !prefs.email.is_empty() => prefs,
            _ => {
                tracing::debug!(user_id, event = ?event, "email notifications off, skipping");
                return Ok(NotifyOutcome::Skipped);
            }
        };

        let (subject, body) = render(event, &ctx);
        let mut last_err = None;

        for attempt in 1..=self.max_send_attempts {
            match self.mailer.send(&prefs.email, &subject, &body).await {
                Ok(()) => {
                    tracing::info!(user_id, event = ?event, "notification sent");
                    return Ok(NotifyOutcome::Sent);
                }
                Err(err) => {
                    tracing::warn!(user_id, attempt, error = %err, "notification send failed");
                    last_err = Some(err);
                    if attempt < self.max_send_attempts {
                        tokio::time::sleep(self.send_retry_delay).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| NotifyError::Send("no send attempts made".to_string())))
    }
}

fn render(event: NotificationEvent, ctx: &NotificationContext) -> (String, String) {
    let noun = match ctx.content_type {
        ContentType::Comment => "comment",
        ContentType::Review => "review",
    };

    match event {
        NotificationEvent::Flagged => (
            format!("Your {} is under review", noun),
            format!(
                "Your {} (#{}) was automatically flagged and is awaiting moderator review.\n\n\
                 {}\n\nNo action is needed from you right now.",
                noun,
                ctx.content_id,
                ctx.reason.as_deref().unwrap_or("Flagged")
            ),
        ),
        NotificationEvent::Approved => (
            format!("Moderation decision on your {}", noun),
            format!(
                "A moderator reviewed your {} (#{}) and upheld the flag.\n\n{}",
                noun,
                ctx.content_id,
                ctx.reason.as_deref().unwrap_or("Flagged")
            ),
        ),
        NotificationEvent::Rejected => (
            format!("Moderation decision on your {}", noun),
            format!(
                "A moderator reviewed your {} (#{}) and dismissed the flag. \
                 No further action will be taken.\n\nReviewer note: {}",
                noun,
                ctx.content_id,
                ctx.rejection_reason.as_deref().unwrap_or("-")
            ),
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Mailer that records every send and can fail the first N attempts.
    pub(crate) struct MockMailer {
        pub(crate) sent: Mutex<Vec<(String, String, String)>>,
        fail_first: AtomicU32,
    }

    impl MockMailer {
        pub(crate) fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_first: AtomicU32::new(0),
            }
        }

        fn failing_first(count: u32) -> Self {
            let mailer = Self::new();
            mailer.fail_first.store(count, Ordering::SeqCst);
            mailer
        }

        pub(crate) fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(NotifyError::Send("smtp timeout".to_string()));
            }
            self.sent.lock().unwrap().push((
                to.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    pub(crate) struct MockPreferenceStore {
        prefs: DashMap<i64, NotificationPrefs>,
    }

    impl MockPreferenceStore {
        pub(crate) fn new() -> Self {
            Self {
                prefs: DashMap::new(),
            }
        }

        pub(crate) fn with_user(self, user_id: i64, email_enabled: bool) -> Self {
            self.prefs.insert(
                user_id,
                NotificationPrefs {
                    user_id,
                    email_enabled,
                    email: format!("user{}@example.com", user_id),
                },
            );
            self
        }
    }

    #[async_trait]
    impl PreferenceStore for MockPreferenceStore {
        async fn get(&self, user_id: i64) -> Result<Option<NotificationPrefs>, NotifyError> {
            Ok(self.prefs.get(&user_id).map(|p| p.clone()))
        }
    }

    fn context() -> NotificationContext {
        NotificationContext {
            content_type: ContentType::Comment,
            content_id: 11,
            reason: Some("Flagged for: Insult (91%)".to_string()),
            rejection_reason: None,
        }
    }

    #[tokio::test]
    async fn notifies_users_with_email_enabled() {
        let mailer = Arc::new(MockMailer::new());
        let prefs = Arc::new(MockPreferenceStore::new().with_user(7, true));
        let service = NotificationService::new(mailer.clone(), prefs);

        let outcome = service
            .notify(7, NotificationEvent::Flagged, context())
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Sent);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "user7@example.com");
        assert!(sent[0].1.contains("comment"));
        assert!(sent[0].2.contains("Flagged for: Insult (91%)"));
    }

    #[tokio::test]
    async fn opted_out_users_are_a_recorded_noop() {
        let mailer = Arc::new(MockMailer::new());
        let prefs = Arc::new(MockPreferenceStore::new().with_user(7, false));
        let service = NotificationService::new(mailer.clone(), prefs);

        let outcome = service
            .notify(7, NotificationEvent::Approved, context())
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn unknown_users_are_skipped() {
        let mailer = Arc::new(MockMailer::new());
        let service =
            NotificationService::new(mailer.clone(), Arc::new(MockPreferenceStore::new()));

        let outcome = service
            .notify(99, NotificationEvent::Rejected, context())
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn transient_send_failures_are_retried() {
        let mailer = Arc::new(MockMailer::failing_first(1));
        let prefs = Arc::new(MockPreferenceStore::new().with_user(7, true));
        let service = NotificationService::new(mailer.clone(), prefs)
            .with_retry(3, Duration::ZERO);

        let outcome = service
            .notify(7, NotificationEvent::Flagged, context())
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Sent);
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_last_error() {
        let mailer = Arc::new(MockMailer::failing_first(10));
        let prefs = Arc::new(MockPreferenceStore::new().with_user(7, true));
        let service = NotificationService::new(mailer.clone(), prefs)
            .with_retry(3, Duration::ZERO);

        let err = service
            .notify(7, NotificationEvent::Flagged, context())
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Send(_)));
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn rejection_note_lands_in_the_body() {
        let mailer = Arc::new(MockMailer::new());
        let prefs = Arc::new(MockPreferenceStore::new().with_user(7, true));
        let service = NotificationService::new(mailer.clone(), prefs);

        let ctx = NotificationContext {
            rejection_reason: Some("false positive".to_string()),
            ..context()
        };
        service
            .notify(7, NotificationEvent::Rejected, ctx)
            .await
            .unwrap();

        let sent = mailer.sent.lock().unwrap();
        assert!(sent[0].2.contains("dismissed"));
        assert!(sent[0].2.contains("false positive"));
    }
}
