use super::classification_models::ClassificationResult;
use async_trait::async_trait;
use thiserror::Error;

/// Longest text we will hand to the classifier. Anything above this is
/// rejected before any network I/O happens.
pub const MAX_ANALYZE_CHARS: usize = 10_000;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

impl ClassifierError {
    /// Transient failures are worth retrying; bad input is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassifierError::Unavailable(_))
    }
}

/// Port to the external text-classification capability.
///
/// Implementations normalize vendor-specific response shapes into
/// `ClassificationResult` and must apply a bounded timeout. They never
/// interpret scores - that is the decision engine's job.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<ClassificationResult, ClassifierError>;
}

/// Input validation shared by classifier implementations.
pub fn validate_text(text: &str) -> Result<(), ClassifierError> {
    if text.trim().is_empty() {
        return Err(ClassifierError::InvalidInput("text is empty".to_string()));
    }
    if text.chars().count() > MAX_ANALYZE_CHARS {
        return Err(ClassifierError::InvalidInput(format!(
            "text exceeds {} characters",
            MAX_ANALYZE_CHARS
        )));
    }
    Ok(())
}
