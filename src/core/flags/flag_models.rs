use crate::core::content::ContentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a flag. Moves PENDING -> APPROVED or
/// PENDING -> REJECTED, exactly once, never backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagStatus {
    Pending,
    Approved,
    Rejected,
}

impl FlagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagStatus::Pending => "PENDING",
            FlagStatus::Approved => "APPROVED",
            FlagStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<FlagStatus> {
        match s {
            "PENDING" => Some(FlagStatus::Pending),
            "APPROVED" => Some(FlagStatus::Approved),
            "REJECTED" => Some(FlagStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded moderation concern about one piece of content.
///
/// At most one record exists per (content_type, content_id), and records
/// are never deleted so the moderation history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagRecord {
    pub id: i64,
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub reason: String,
    pub status: FlagStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<i64>,
}

/// Insert payload for a new flag.
#[derive(Debug, Clone)]
pub struct NewFlag {
    pub content_type: ContentType,
    pub content_id: i64,
    pub author_id: i64,
    pub reason: String,
}

/// Filters for flag listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagFilter {
    pub status: Option<FlagStatus>,
    pub content_type: Option<ContentType>,
}

/// One page of flag records.
#[derive(Debug, Clone)]
pub struct FlagPage {
    pub items: Vec<FlagRecord>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}
