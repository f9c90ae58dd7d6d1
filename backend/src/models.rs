use crate::error::PipelineError;
use log::warn;
use rocket::http::{ContentType, Header, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket::{response, Response};
use std::io::Cursor;

/// Session id presented by the client, either as `X-Session-Id` header or `?session=` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef {
    pub id: String,
}

impl VideoRef {
    pub fn new(id: impl Into<String>) -> Self {
        VideoRef { id: id.into() }
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub url: String,
    pub title: String,
    pub channel: String,
    pub thumbnail_url: String,
    pub like_count: u64,
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: String, // RFC 3339, as delivered upstream
    pub reply_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Neutral => "neutral",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Unknown => "Unscored",
        }
    }

    pub fn chart_color(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "green",
            SentimentLabel::Neutral => "gray",
            SentimentLabel::Negative => "red",
            SentimentLabel::Unknown => "orange",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub label: SentimentLabel,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnnotatedComment {
    pub fn scored(comment: Comment, label: SentimentLabel, score: f64) -> Self {
        AnnotatedComment {
            comment,
            label,
            score,
            error: None,
        }
    }

    pub fn unscored(comment: Comment, error: &PipelineError) -> Self {
        AnnotatedComment {
            comment,
            label: SentimentLabel::Unknown,
            score: 0.0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive_count: usize,
    pub neutral_count: usize,
    pub negative_count: usize,
    pub unscored_count: usize,
    pub total: usize,
    pub positive_percent: f64,
    pub neutral_percent: f64,
    pub negative_percent: f64,
    pub unscored_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSlice {
    pub label: SentimentLabel,
    pub name: String,
    pub percent: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub title: String,
    pub summary: SentimentSummary,
    pub chart: Vec<ChartSlice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Resolve,
    Metadata,
    Comments,
    Sentiment,
    Summary,
}

impl PipelineStage {
    /// Progress reached once the stage has completed.
    pub fn progress(&self) -> u8 {
        match self {
            PipelineStage::Resolve => 25,
            PipelineStage::Metadata => 50,
            PipelineStage::Comments => 75,
            PipelineStage::Sentiment | PipelineStage::Summary => 100,
        }
    }

    /// Status line shown while the stage is running.
    pub fn running_message(&self) -> &'static str {
        match self {
            PipelineStage::Resolve => "Fetching video info...",
            PipelineStage::Metadata => "Fetching video info...",
            PipelineStage::Comments => "Fetching comments...",
            PipelineStage::Sentiment => "Analysing comment sentiment...",
            PipelineStage::Summary => "Analysing comment sentiment...",
        }
    }
}

pub const COMPLETE_MESSAGE: &str = "Sentiment analysis complete.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub video_id: String,
    pub progress: u8,
    pub status: String,
    pub failed_stage: Option<PipelineStage>,
    pub metadata: Option<VideoMetadata>,
    pub comments: Vec<Comment>,
    pub annotated: Vec<AnnotatedComment>,
    pub summary: Option<SummaryResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip)]
    pub status: Status,
}

impl ErrorResponse {
    pub fn new(status: Status, error: &str, message: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: message.into(),
            status,
        }
    }
}

impl From<PipelineError> for ErrorResponse {
    fn from(e: PipelineError) -> Self {
        warn!("Request failed with {}: {e}", e.code());
        ErrorResponse::new(e.status(), e.code(), e.to_string())
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

/// A CSV export served as a file download.
#[derive(Debug)]
pub struct CsvDownload {
    pub file_name: String,
    pub body: Vec<u8>,
}

impl<'r> Responder<'r, 'static> for CsvDownload {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        Response::build()
            .status(Status::Ok)
            .header(ContentType::CSV)
            .header(Header::new("Content-Disposition", disposition))
            .sized_body(self.body.len(), Cursor::new(self.body))
            .ok()
    }
}
