// Decision policy mapping classifier output to a moderation verdict.
//
// This must stay a pure function: the synchronous preview path and the
// asynchronous worker path both call it, and the two must never disagree
// for the same classification.

use super::classification_models::{CategoryScore, ClassificationResult, Verdict};

/// Any single category at or above this confidence is flagged outright.
pub const CATEGORY_FLAG_THRESHOLD: f32 = 0.70;
/// Sentiment at or below this, paired with a supporting category, is flagged.
pub const SENTIMENT_FLAG_THRESHOLD: f32 = -0.60;
/// Minimum category confidence that can support a sentiment-based flag.
pub const SUPPORTING_CATEGORY_THRESHOLD: f32 = 0.40;

/// Derive a verdict from a classification. Deterministic and side-effect
/// free; the same input always yields the same output.
pub fn decide(classification: &ClassificationResult) -> Verdict {
    let top = top_category(&classification.categories);

    let is_toxic = match top {
        Some(c) if c.confidence >= CATEGORY_FLAG_THRESHOLD => true,
        Some(c) => {
            classification.sentiment_score <= SENTIMENT_FLAG_THRESHOLD
                && c.confidence >= SUPPORTING_CATEGORY_THRESHOLD
        }
        None => false,
    };

    Verdict {
        is_toxic,
        reason: if is_toxic { top.map(format_reason) } else { None },
        classification: classification.clone(),
    }
}

fn top_category(categories: &[CategoryScore]) -> Option<&CategoryScore> {
    categories.iter().max_by(|a, b| {
        a.confidence
            .partial_cmp(&b.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

fn format_reason(category: &CategoryScore) -> String {
    format!(
        "Flagged for: {} ({}%)",
        category.name,
        (category.confidence * 100.0).round() as u32
    )
}
