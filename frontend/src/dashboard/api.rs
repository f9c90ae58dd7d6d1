use crate::env_variable_utils::BACKEND_URL;
use crate::models::{
    AnnotatedComment, Comment, ErrorResponse, SessionResponse, SummaryResponse, VideoMetadata,
    VideoRef,
};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

const SESSION_HEADER: &str = "X-Session-Id";
const SESSION_NOT_FOUND: &str = "session_not_found";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CsvKind {
    Comments,
    Sentiment,
}

/// A failed backend call. `code` is the backend's error code when it sent a JSON error body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    fn transport(message: String) -> Self {
        ApiError {
            code: None,
            message,
        }
    }

    /// The session expired or was never issued; a fresh one is needed.
    pub fn session_expired(&self) -> bool {
        self.code.as_deref() == Some(SESSION_NOT_FOUND)
    }
}

pub fn error_from_body(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error_response) => ApiError {
            code: Some(error_response.error),
            message: error_response.message,
        },
        Err(_) if body.is_empty() => ApiError::transport(format!("Request failed with status: {status}")),
        Err(_) => ApiError::transport(format!("Request failed ({status}): {body}")),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if response.ok() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to parse response: {e}")));
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = error_from_body(status, &body);
    log::warn!("Backend error {:?}: {}", error.code, error.message);
    Err(error)
}

async fn get_json<T: DeserializeOwned>(session_id: &str, path: &str) -> Result<T, ApiError> {
    let url = format!("{}{path}", &*BACKEND_URL);
    let response = Request::get(&url)
        .header(SESSION_HEADER, session_id)
        .send()
        .await
        .map_err(|e| ApiError::transport(format!("Failed to connect to backend: {e}")))?;
    read_json(response).await
}

/// `/video/<id><suffix>` with the id percent-encoded as a single path segment.
pub fn video_path(video_id: &str, suffix: &str) -> String {
    format!("/video/{}{suffix}", urlencoding::encode(video_id))
}

pub async fn create_session() -> Result<String, ApiError> {
    let url = format!("{}/session", &*BACKEND_URL);
    let response = Request::post(&url)
        .send()
        .await
        .map_err(|e| ApiError::transport(format!("Failed to connect to backend: {e}")))?;
    let session: SessionResponse = read_json(response).await?;
    Ok(session.session_id)
}

pub async fn resolve_video(session_id: &str, url: &str) -> Result<VideoRef, ApiError> {
    get_json(
        session_id,
        &format!("/video/resolve?url={}", urlencoding::encode(url)),
    )
    .await
}

pub async fn fetch_metadata(session_id: &str, video_id: &str) -> Result<VideoMetadata, ApiError> {
    get_json(session_id, &video_path(video_id, "")).await
}

pub async fn fetch_comments(session_id: &str, video_id: &str) -> Result<Vec<Comment>, ApiError> {
    get_json(session_id, &video_path(video_id, "/comments")).await
}

pub async fn fetch_sentiment(
    session_id: &str,
    video_id: &str,
) -> Result<Vec<AnnotatedComment>, ApiError> {
    get_json(session_id, &video_path(video_id, "/sentiment")).await
}

pub async fn fetch_summary(session_id: &str, video_id: &str) -> Result<SummaryResponse, ApiError> {
    get_json(session_id, &video_path(video_id, "/summary")).await
}

// Anchors cannot send headers, so the session rides along as a query parameter
pub fn download_url(session_id: &str, video_id: &str, kind: CsvKind) -> String {
    let suffix = match kind {
        CsvKind::Comments => "/comments.csv",
        CsvKind::Sentiment => "/sentiment.csv",
    };
    format!(
        "{}{}?session={}",
        &*BACKEND_URL,
        video_path(video_id, suffix),
        urlencoding::encode(session_id)
    )
}
