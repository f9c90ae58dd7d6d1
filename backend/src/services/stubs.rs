//! In-process stand-ins for the YouTube and classifier services.

use crate::error::PipelineError;
use crate::models::{Comment, SentimentLabel, VideoMetadata, VideoRef};
use crate::services::sentiment_service::{Classification, SentimentClassifier};
use crate::services::youtube_service::VideoSource;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn sample_comment(author: &str, text: &str) -> Comment {
    Comment {
        author: author.to_string(),
        text: text.to_string(),
        like_count: 3,
        published_at: "2024-05-01T10:00:00Z".to_string(),
        reply_count: 1,
    }
}

pub fn sample_metadata(id: &str) -> VideoMetadata {
    VideoMetadata {
        id: id.to_string(),
        url: VideoRef::new(id).watch_url(),
        title: "Stub Video".to_string(),
        channel: "Stub Channel".to_string(),
        thumbnail_url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
        like_count: 120,
        comment_count: 3,
    }
}

/// Knows exactly one video; counts upstream calls.
pub struct StubSource {
    pub known_id: String,
    pub comments: Result<Vec<Comment>, PipelineError>,
    pub metadata_calls: AtomicUsize,
    pub comment_calls: AtomicUsize,
}

impl StubSource {
    pub fn new(known_id: &str, comments: Vec<Comment>) -> Self {
        StubSource {
            known_id: known_id.to_string(),
            comments: Ok(comments),
            metadata_calls: AtomicUsize::new(0),
            comment_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_comments(known_id: &str) -> Self {
        StubSource {
            comments: Err(PipelineError::CommentsFetchFailed(
                "HTTP 403 Forbidden - quota exceeded".to_string(),
            )),
            ..StubSource::new(known_id, Vec::new())
        }
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn comment_calls(&self) -> usize {
        self.comment_calls.load(Ordering::SeqCst)
    }
}

#[rocket::async_trait]
impl VideoSource for StubSource {
    async fn fetch_metadata(
        &self,
        video: &VideoRef,
    ) -> Result<Option<VideoMetadata>, PipelineError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if video.id == self.known_id {
            Ok(Some(sample_metadata(&video.id)))
        } else {
            Ok(None)
        }
    }

    async fn fetch_comments(
        &self,
        _video: &VideoRef,
        max_results: u32,
    ) -> Result<Vec<Comment>, PipelineError> {
        self.comment_calls.fetch_add(1, Ordering::SeqCst);
        self.comments
            .clone()
            .map(|comments| comments.into_iter().take(max_results as usize).collect())
    }
}

/// "good" is positive, "bad" negative, "fail" an upstream error, anything else neutral.
#[derive(Default)]
pub struct KeywordClassifier {
    seen: Mutex<Vec<String>>,
}

impl KeywordClassifier {
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[rocket::async_trait]
impl SentimentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, PipelineError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(text.to_string());
        }

        let lowered = text.to_lowercase();
        if lowered.contains("fail") {
            return Err(PipelineError::ClassificationFailed(
                "HTTP 503 Service Unavailable".to_string(),
            ));
        }
        let (label, score) = if lowered.contains("good") {
            (SentimentLabel::Positive, 0.9)
        } else if lowered.contains("bad") {
            (SentimentLabel::Negative, 0.8)
        } else {
            (SentimentLabel::Neutral, 0.6)
        };
        Ok(Classification { label, score })
    }
}
