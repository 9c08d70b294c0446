use crate::core::content::ContentType;
use serde::{Deserialize, Serialize};

/// Flag lifecycle event a content owner can be notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    Flagged,
    Approved,
    Rejected,
}

/// Per-user delivery settings. Owned by the user profile layer; the
/// dispatcher only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub user_id: i64,
    pub email_enabled: bool,
    pub email: String,
}

/// Details interpolated into the notification templates.
#[derive(Debug, Clone)]
pub struct NotificationContext {
    pub content_type: ContentType,
    pub content_id: i64,
    pub reason: Option<String>,
    pub rejection_reason: Option<String>,
}

/// What happened to a notification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// User opted out or has no delivery address - a recorded no-op.
    Skipped,
}
