use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub url: String,
    pub title: String,
    pub channel: String,
    pub thumbnail_url: String,
    pub like_count: u64,
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_at: String,
    pub reply_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
    Unknown,
}

impl SentimentLabel {
    pub fn display_name(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Unknown => "Unscored",
        }
    }

    pub fn badge_class(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "bg-green-100 text-green-800",
            SentimentLabel::Neutral => "bg-gray-100 text-gray-800",
            SentimentLabel::Negative => "bg-red-100 text-red-800",
            SentimentLabel::Unknown => "bg-orange-100 text-orange-800",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotatedComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub label: SentimentLabel,
    pub score: f64,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
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

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartSlice {
    pub label: SentimentLabel,
    pub name: String,
    pub percent: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummaryResponse {
    pub title: String,
    pub summary: SentimentSummary,
    pub chart: Vec<ChartSlice>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
