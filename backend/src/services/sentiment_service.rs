use crate::error::PipelineError;
use crate::models::{AnnotatedComment, Comment, SentimentLabel};
use crate::utils::truncate_chars;
use anyhow::Result;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: SentimentLabel,
    pub score: f64,
}

/// An external, pretrained text classifier.
#[rocket::async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<Classification, PipelineError>;
}

/// Map the model's label tokens onto the fixed label set.
pub fn normalize_label(raw: &str) -> Option<SentimentLabel> {
    match raw.trim().to_lowercase().as_str() {
        "olumlu" | "positive" | "pos" | "label_2" => Some(SentimentLabel::Positive),
        "notr" | "nötr" | "neutral" | "label_1" => Some(SentimentLabel::Neutral),
        "olumsuz" | "negative" | "neg" | "label_0" => Some(SentimentLabel::Negative),
        _ => None,
    }
}

/// Text classifier hosted behind the Hugging Face inference API.
pub struct HuggingFaceClassifier {
    client: Client,
    endpoint: String,
    token: String,
}

impl HuggingFaceClassifier {
    pub fn new(api_base: &str, model: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HuggingFaceClassifier {
            client,
            endpoint: format!("{}/{model}", api_base.trim_end_matches('/')),
            token: token.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<Candidate>>),
    Flat(Vec<Candidate>),
    Failure { error: String },
}

pub(crate) fn parse_inference_response(body: &str) -> Result<Classification, PipelineError> {
    let response: InferenceResponse = serde_json::from_str(body).map_err(|e| {
        PipelineError::ClassificationFailed(format!("unexpected classifier response: {e}"))
    })?;

    let candidates = match response {
        InferenceResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
        InferenceResponse::Flat(candidates) => candidates,
        InferenceResponse::Failure { error } => {
            return Err(PipelineError::ClassificationFailed(error));
        }
    };

    let best = candidates
        .into_iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(std::cmp::Ordering::Equal))
        .ok_or_else(|| {
            PipelineError::ClassificationFailed("classifier returned no labels".to_string())
        })?;

    let label = normalize_label(&best.label).ok_or_else(|| {
        PipelineError::ClassificationFailed(format!("unknown classifier label '{}'", best.label))
    })?;

    Ok(Classification {
        label,
        score: best.score.clamp(0.0, 1.0),
    })
}

/// Non-2xx replies fail with the status, plus the service's own message when it sent one.
pub(crate) fn classification_from_response(
    status: StatusCode,
    body: &str,
) -> Result<Classification, PipelineError> {
    if status.is_success() {
        return parse_inference_response(body);
    }

    let message = match serde_json::from_str::<InferenceResponse>(body) {
        Ok(InferenceResponse::Failure { error }) => format!("HTTP {status} - {error}"),
        _ => format!("HTTP {status}"),
    };
    Err(PipelineError::ClassificationFailed(message))
}

#[rocket::async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, PipelineError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "inputs": text, "options": { "wait_for_model": true } }))
            .send()
            .await
            .map_err(|e| PipelineError::ClassificationFailed(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::ClassificationFailed(e.without_url().to_string()))?;

        classification_from_response(status, &body)
    }
}

/// Applies a classifier to comments one row at a time.
pub struct SentimentAnnotator {
    classifier: Arc<dyn SentimentClassifier>,
    max_chars: usize,
}

impl SentimentAnnotator {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, max_chars: usize) -> Self {
        SentimentAnnotator {
            classifier,
            max_chars,
        }
    }

    pub async fn score_text(&self, text: &str) -> Result<Classification, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::ClassificationFailed(
                "comment text is empty".to_string(),
            ));
        }
        self.classifier
            .classify(truncate_chars(text, self.max_chars))
            .await
    }

    /// Output order matches input order; a failed row becomes `unknown` instead of failing the batch.
    pub async fn annotate(&self, comments: &[Comment]) -> Vec<AnnotatedComment> {
        let mut annotated = Vec::with_capacity(comments.len());
        let mut failures = 0;

        for (index, comment) in comments.iter().enumerate() {
            match self.score_text(&comment.text).await {
                Ok(classification) => annotated.push(AnnotatedComment::scored(
                    comment.clone(),
                    classification.label,
                    classification.score,
                )),
                Err(e) => {
                    warn!("Comment #{index} by {} left unscored: {e}", comment.author);
                    failures += 1;
                    annotated.push(AnnotatedComment::unscored(comment.clone(), &e));
                }
            }
        }

        info!(
            "Annotated {} comments ({} unscored)",
            annotated.len(),
            failures
        );
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stubs::KeywordClassifier;

    fn comment(text: &str) -> Comment {
        Comment {
            author: "@tester".to_string(),
            text: text.to_string(),
            like_count: 0,
            published_at: "2024-05-01T10:00:00Z".to_string(),
            reply_count: 0,
        }
    }

    #[test]
    fn normalizes_model_tokens() {
        assert_eq!(normalize_label("olumlu"), Some(SentimentLabel::Positive));
        assert_eq!(normalize_label("NOTR"), Some(SentimentLabel::Neutral));
        assert_eq!(normalize_label("nötr"), Some(SentimentLabel::Neutral));
        assert_eq!(normalize_label(" olumsuz "), Some(SentimentLabel::Negative));
        assert_eq!(normalize_label("LABEL_2"), Some(SentimentLabel::Positive));
        assert_eq!(normalize_label("mixed"), None);
    }

    #[test]
    fn picks_highest_scoring_candidate() {
        let body = r#"[[{"label": "olumsuz", "score": 0.05},
                        {"label": "olumlu", "score": 0.9},
                        {"label": "notr", "score": 0.05}]]"#;
        let classification = parse_inference_response(body).unwrap();
        assert_eq!(classification.label, SentimentLabel::Positive);
        assert_eq!(classification.score, 0.9);

        let flat = r#"[{"label": "notr", "score": 0.7}, {"label": "olumsuz", "score": 0.3}]"#;
        assert_eq!(
            parse_inference_response(flat).unwrap().label,
            SentimentLabel::Neutral
        );
    }

    #[test]
    fn inference_errors_are_classification_failures() {
        assert_eq!(
            parse_inference_response(r#"{"error": "Model is loading"}"#),
            Err(PipelineError::ClassificationFailed(
                "Model is loading".to_string()
            ))
        );
        assert!(parse_inference_response("[[]]").is_err());
        assert!(parse_inference_response(r#"[{"label": "sarcastic", "score": 1.0}]"#).is_err());
    }

    #[rocket::async_test]
    async fn long_text_is_truncated_the_same_way_every_time() {
        let classifier = Arc::new(KeywordClassifier::default());
        let annotator = SentimentAnnotator::new(classifier.clone(), 512);
        let text = format!("good {}", "x".repeat(995));
        assert_eq!(text.chars().count(), 1000);

        annotator.score_text(&text).await.unwrap();
        annotator.score_text(&text).await.unwrap();

        let seen = classifier.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].chars().count(), 512);
        assert_eq!(seen[0], seen[1]);
        assert!(text.starts_with(&seen[0]));
    }

    #[rocket::async_test]
    async fn empty_text_fails_without_calling_classifier() {
        let classifier = Arc::new(KeywordClassifier::default());
        let annotator = SentimentAnnotator::new(classifier.clone(), 512);

        let result = annotator.score_text("   ").await;
        assert!(matches!(result, Err(PipelineError::ClassificationFailed(_))));
        assert!(classifier.seen().is_empty());
    }

    #[rocket::async_test]
    async fn failed_rows_are_isolated() {
        let annotator = SentimentAnnotator::new(Arc::new(KeywordClassifier::default()), 512);
        let comments = vec![
            comment("good video"),
            comment(""),
            comment("this will fail upstream"),
            comment("bad audio"),
        ];

        let annotated = annotator.annotate(&comments).await;
        let labels: Vec<SentimentLabel> = annotated.iter().map(|a| a.label).collect();
        assert_eq!(
            labels,
            vec![
                SentimentLabel::Positive,
                SentimentLabel::Unknown,
                SentimentLabel::Unknown,
                SentimentLabel::Negative,
            ]
        );
        assert!(annotated[0].error.is_none());
        assert!(annotated[1].error.is_some());
        assert_eq!(annotated[2].score, 0.0);
        assert_eq!(annotated[3].comment, comments[3]);
    }

    #[test]
    fn error_statuses_fail_with_the_service_message() {
        assert_eq!(
            classification_from_response(
                StatusCode::SERVICE_UNAVAILABLE,
                r#"{"error": "Model HamzaEren/sentiment_model_final is currently loading"}"#
            ),
            Err(PipelineError::ClassificationFailed(
                "HTTP 503 Service Unavailable - Model HamzaEren/sentiment_model_final is currently loading"
                    .to_string()
            ))
        );
        assert_eq!(
            classification_from_response(StatusCode::UNAUTHORIZED, "Unauthorized"),
            Err(PipelineError::ClassificationFailed(
                "HTTP 401 Unauthorized".to_string()
            ))
        );
        // A label body under an error status is still a failure
        assert!(classification_from_response(
            StatusCode::BAD_GATEWAY,
            r#"[{"label": "olumlu", "score": 0.9}]"#
        )
        .is_err());
    }

    #[test]
    fn success_status_parses_the_best_label() {
        let classification = classification_from_response(
            StatusCode::OK,
            r#"[[{"label": "olumsuz", "score": 0.7}, {"label": "olumlu", "score": 0.3}]]"#,
        )
        .unwrap();
        assert_eq!(classification.label, SentimentLabel::Negative);
        assert_eq!(classification.score, 0.7);
    }
}
