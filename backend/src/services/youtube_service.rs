use crate::error::PipelineError;
use crate::models::{Comment, VideoMetadata, VideoRef};
use crate::utils::parse_count;
use anyhow::Result;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Upstream limit for `maxResults` on commentThreads.
pub const MAX_RESULTS_LIMIT: u32 = 100;

#[rocket::async_trait]
pub trait VideoSource: Send + Sync {
    /// `Ok(None)` when the service knows no video with this id.
    async fn fetch_metadata(
        &self,
        video: &VideoRef,
    ) -> Result<Option<VideoMetadata>, PipelineError>;

    /// One page of top-level comments, in upstream order.
    async fn fetch_comments(
        &self,
        video: &VideoRef,
        max_results: u32,
    ) -> Result<Vec<Comment>, PipelineError>;
}

pub struct YouTubeClient {
    client: Client,
    api_key: String,
    api_base: String,
}

impl YouTubeClient {
    pub fn new(api_key: &str, api_base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(YouTubeClient {
            client,
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn get(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), reqwest::Error> {
        // Documentation: https://developers.google.com/youtube/v3/docs
        let url = format!("{}/{resource}", self.api_base);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[rocket::async_trait]
impl VideoSource for YouTubeClient {
    async fn fetch_metadata(
        &self,
        video: &VideoRef,
    ) -> Result<Option<VideoMetadata>, PipelineError> {
        let (status, body) = self
            .get("videos", &[("part", "snippet,statistics"), ("id", video.id.as_str())])
            .await
            .map_err(|e| PipelineError::MetadataFetchFailed(e.without_url().to_string()))?;

        let metadata = metadata_from_response(status, &body)?;
        info!(
            "Fetched metadata for video {}: found={}",
            video.id,
            metadata.is_some()
        );
        Ok(metadata)
    }

    async fn fetch_comments(
        &self,
        video: &VideoRef,
        max_results: u32,
    ) -> Result<Vec<Comment>, PipelineError> {
        let max_results = max_results.clamp(1, MAX_RESULTS_LIMIT).to_string();
        let (status, body) = self
            .get(
                "commentThreads",
                &[
                    ("part", "snippet"),
                    ("videoId", video.id.as_str()),
                    ("maxResults", max_results.as_str()),
                    ("textFormat", "plainText"),
                ],
            )
            .await
            .map_err(|e| PipelineError::CommentsFetchFailed(e.without_url().to_string()))?;

        let comments = comments_from_response(status, &body)?;
        info!("Fetched {} comments for video {}", comments.len(), video.id);
        Ok(comments)
    }
}

/// Maps a `videos` reply onto metadata. An empty item list is `Ok(None)`.
pub(crate) fn metadata_from_response(
    status: StatusCode,
    body: &str,
) -> Result<Option<VideoMetadata>, PipelineError> {
    if !status.is_success() {
        return Err(PipelineError::MetadataFetchFailed(describe_api_error(
            status, body,
        )));
    }

    parse_video_list(body).map_err(|e| {
        PipelineError::MetadataFetchFailed(format!("unexpected videos response: {e}"))
    })
}

/// Maps a `commentThreads` reply onto comments. Disabled comments read as an empty list.
pub(crate) fn comments_from_response(
    status: StatusCode,
    body: &str,
) -> Result<Vec<Comment>, PipelineError> {
    if !status.is_success() {
        if api_error_reason(body).as_deref() == Some("commentsDisabled") {
            warn!("Comments are disabled for this video");
            return Ok(Vec::new());
        }
        return Err(PipelineError::CommentsFetchFailed(describe_api_error(
            status, body,
        )));
    }

    parse_comment_threads(body).map_err(|e| {
        PipelineError::CommentsFetchFailed(format!("unexpected commentThreads response: {e}"))
    })
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThreadListResponse {
    #[serde(default)]
    items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
struct CommentThread {
    snippet: CommentThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: TopLevelComment,
    #[serde(default)]
    total_reply_count: u64,
}

#[derive(Debug, Deserialize)]
struct TopLevelComment {
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    #[serde(default)]
    author_display_name: String,
    #[serde(default)]
    text_display: String,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: String,
}

pub(crate) fn parse_video_list(body: &str) -> Result<Option<VideoMetadata>, serde_json::Error> {
    let response: VideoListResponse = serde_json::from_str(body)?;

    Ok(response.items.into_iter().next().map(|item| {
        let thumbnails = item.snippet.thumbnails;
        let thumbnail_url = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.fallback)
            .map(|thumbnail| thumbnail.url)
            .unwrap_or_default();

        VideoMetadata {
            url: VideoRef::new(item.id.as_str()).watch_url(),
            id: item.id,
            title: item.snippet.title,
            channel: item.snippet.channel_title,
            thumbnail_url,
            like_count: parse_count(item.statistics.like_count.as_deref()),
            comment_count: parse_count(item.statistics.comment_count.as_deref()),
        }
    }))
}

pub(crate) fn parse_comment_threads(body: &str) -> Result<Vec<Comment>, serde_json::Error> {
    let response: CommentThreadListResponse = serde_json::from_str(body)?;

    Ok(response
        .items
        .into_iter()
        .map(|thread| {
            let snippet = thread.snippet.top_level_comment.snippet;
            Comment {
                author: snippet.author_display_name,
                text: snippet.text_display,
                like_count: snippet.like_count,
                published_at: snippet.published_at,
                reply_count: thread.snippet.total_reply_count,
            }
        })
        .collect())
}

fn api_error_reason(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.errors.into_iter().next())
        .map(|detail| detail.reason)
}

fn describe_api_error(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            format!("HTTP {status} - {}", envelope.error.message)
        }
        _ => format!("HTTP {status}"),
    }
}
