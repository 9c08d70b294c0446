use super::classification_models::Verdict;
use super::classifier::{ClassifierError, TextClassifier};
use super::decision_engine::decide;
use std::sync::Arc;

/// Runs the classifier and the decision engine as a single step.
///
/// The synchronous preview path and the queue workers both go through this
/// service, so a given text can never receive two different policies.
pub struct ScreeningService {
    classifier: Arc<dyn TextClassifier>,
}

impl ScreeningService {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    pub async fn screen(&self, text: &str) -> Result<Verdict, ClassifierError> {
        let classification = self.classifier.analyze(text).await?;
        let verdict = decide(&classification);
        tracing::debug!(
            is_toxic = verdict.is_toxic,
            reason = verdict.reason.as_deref().unwrap_or("-"),
            "text screened"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classification::{CategoryScore, ClassificationResult};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    /// Classifier that always returns the same canned result.
    struct FixedClassifier {
        result: ClassificationResult,
    }

    #[async_trait]
    impl TextClassifier for FixedClassifier {
        async fn analyze(&self, _text: &str) -> Result<ClassificationResult, ClassifierError> {
            Ok(self.result.clone())
        }
    }

    struct DownClassifier;

    #[async_trait]
    impl TextClassifier for DownClassifier {
        async fn analyze(&self, _text: &str) -> Result<ClassificationResult, ClassifierError> {
            Err(ClassifierError::Unavailable("connection refused".to_string()))
        }
    }

    fn hostile_classification() -> ClassificationResult {
        ClassificationResult {
            sentiment_score: -0.85,
            categories: vec![CategoryScore {
                name: "Insult".to_string(),
                confidence: 0.91,
            }],
            analyzed_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn screening_matches_the_decision_engine() {
        let classification = hostile_classification();
        let service = ScreeningService::new(Arc::new(FixedClassifier {
            result: classification.clone(),
        }));

        let verdict = service.screen("I hate you, you are worthless").await.unwrap();

        // The service adds nothing on top of decide(); the two paths that
        // share it therefore cannot diverge.
        assert_eq!(verdict, decide(&classification));
        assert!(verdict.is_toxic);
    }

    #[tokio::test]
    async fn classifier_errors_pass_through() {
        let service = ScreeningService::new(Arc::new(DownClassifier));

        let err = service.screen("anything").await.unwrap_err();

        assert!(err.is_retryable());
    }
}
