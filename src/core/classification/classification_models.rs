use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One category score from the classifier, normalized to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub name: String,
    pub confidence: f32,
}

/// Normalized output of a single classifier call.
///
/// Ephemeral: either discarded after a preview or folded into a `Verdict`.
/// Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Document sentiment in [-1, 1]; negative reads as hostile.
    pub sentiment_score: f32,
    pub categories: Vec<CategoryScore>,
    pub analyzed_at: DateTime<Utc>,
}

/// The moderation decision derived from a classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_toxic: bool,
    /// Human-readable reason, e.g. "Flagged for: Insult (82%)".
    /// None when the content is clean.
    pub reason: Option<String>,
    pub classification: ClassificationResult,
}
