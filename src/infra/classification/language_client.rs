// =============================================================================
// GOOGLE CLOUD NATURAL LANGUAGE CLIENT
// =============================================================================
//
// Implementation of the `TextClassifier` trait backed by the Cloud Natural
// Language API (https://cloud.google.com/natural-language/docs).
//
// A single `documents:annotateText` call returns both pieces the decision
// engine needs:
// - `documentSentiment.score` in [-1, 1]
// - `moderationCategories[]` with confidences in [0, 1]
//
// **Authentication:** API key passed as a query parameter (`?key=API_KEY`).
//
// The vendor response shape is normalized here and nowhere else; the rest
// of the pipeline only ever sees `ClassificationResult`.

use crate::core::classification::{
    validate_text, CategoryScore, ClassificationResult, ClassifierError, TextClassifier,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://language.googleapis.com/v1/documents:annotateText";

/// Hard ceiling on one classification round-trip. The pipeline must never
/// block indefinitely on this call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// API DATA STRUCTURES
// =============================================================================

#[derive(Debug, Serialize)]
struct AnnotateRequest {
    document: Document,
    features: Features,
}

#[derive(Debug, Serialize)]
struct Document {
    #[serde(rename = "type")]
    doc_type: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Features {
    extract_document_sentiment: bool,
    moderate_text: bool,
}

/// Response fields we care about. Everything is optional/defaulted because
/// the API omits sections that produced no signal.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct AnnotateResponse {
    document_sentiment: Option<Sentiment>,
    moderation_categories: Vec<ModerationCategory>,
}

#[derive(Debug, Deserialize, Default)]
struct Sentiment {
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct ModerationCategory {
    name: String,
    #[serde(default)]
    confidence: f32,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GoogleLanguageClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GoogleLanguageClient {
    pub fn new(api_key: String) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (regional hosts, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TextClassifier for GoogleLanguageClient {
    async fn analyze(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        validate_text(text)?;

        let request = AnnotateRequest {
            document: Document {
                doc_type: "PLAIN_TEXT",
                content: text.to_string(),
            },
            features: Features {
                extract_document_sentiment: true,
                moderate_text: true,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Unavailable(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let parsed: AnnotateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("malformed response: {}", e)))?;

        Ok(normalize(parsed))
    }
}

/// Fold the vendor response into the pipeline's normalized shape. Scores
/// are clamped to their documented ranges; nothing here interprets them.
fn normalize(response: AnnotateResponse) -> ClassificationResult {
    let sentiment_score = response
        .document_sentiment
        .map(|s| s.score)
        .unwrap_or(0.0)
        .clamp(-1.0, 1.0);

    let categories = response
        .moderation_categories
        .into_iter()
        .map(|c| CategoryScore {
            name: c.name,
            confidence: c.confidence.clamp(0.0, 1.0),
        })
        .collect();

    ClassificationResult {
        sentiment_score,
        categories,
        analyzed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_a_full_response() {
        let parsed: AnnotateResponse = serde_json::from_str(
            r#"{
                "documentSentiment": { "magnitude": 1.2, "score": -0.85 },
                "moderationCategories": [
                    { "name": "Insult", "confidence": 0.91 },
                    { "name": "Profanity", "confidence": 0.35 }
                ],
                "languageCode": "en"
            }"#,
        )
        .unwrap();

        let result = normalize(parsed);

        assert_eq!(result.sentiment_score, -0.85);
        assert_eq!(result.categories.len(), 2);
        assert_eq!(result.categories[0].name, "Insult");
        assert_eq!(result.categories[0].confidence, 0.91);
    }

    #[test]
    fn missing_sections_default_to_neutral() {
        let parsed: AnnotateResponse = serde_json::from_str("{}").unwrap();

        let result = normalize(parsed);

        assert_eq!(result.sentiment_score, 0.0);
        assert!(result.categories.is_empty());
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let parsed: AnnotateResponse = serde_json::from_str(
            r#"{
                "documentSentiment": { "score": -1.7 },
                "moderationCategories": [ { "name": "Toxic", "confidence": 1.4 } ]
            }"#,
        )
        .unwrap();

        let result = normalize(parsed);

        assert_eq!(result.sentiment_score, -1.0);
        assert_eq!(result.categories[0].confidence, 1.0);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_request() {
        // Bogus endpoint: if validation didn't short-circuit, this would
        // fail with Unavailable instead.
        let client = GoogleLanguageClient::new("test-key".to_string())
            .unwrap()
            .with_endpoint("http://127.0.0.1:1/annotate");

        let err = client.analyze("   ").await.unwrap_err();

        assert!(matches!(err, ClassifierError::InvalidInput(_)));
    }
}
