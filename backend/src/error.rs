use rocket::http::Status;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("Not a recognized YouTube video URL: {0}")]
    UnrecognizedUrl(String),
    #[error("Video {0} was not found")]
    VideoNotFound(String),
    #[error("Failed to fetch video metadata: {0}")]
    MetadataFetchFailed(String),
    #[error("Failed to fetch comments: {0}")]
    CommentsFetchFailed(String),
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),
    #[error("A session id is required (X-Session-Id header or session query parameter)")]
    SessionRequired,
    #[error("Session {0} does not exist or has expired")]
    SessionNotFound(String),
}

impl PipelineError {
    /// Machine readable error code, used as the `error` field of JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::UnrecognizedUrl(_) => "unrecognized_url",
            PipelineError::VideoNotFound(_) => "video_not_found",
            PipelineError::MetadataFetchFailed(_) => "metadata_fetch_failed",
            PipelineError::CommentsFetchFailed(_) => "comments_fetch_failed",
            PipelineError::ClassificationFailed(_) => "classification_failed",
            PipelineError::SessionRequired => "session_required",
            PipelineError::SessionNotFound(_) => "session_not_found",
        }
    }

    pub fn status(&self) -> Status {
        match self {
            PipelineError::UnrecognizedUrl(_) => Status::BadRequest,
            PipelineError::VideoNotFound(_) => Status::NotFound,
            PipelineError::MetadataFetchFailed(_) => Status::BadGateway,
            PipelineError::CommentsFetchFailed(_) => Status::BadGateway,
            PipelineError::ClassificationFailed(_) => Status::BadGateway,
            PipelineError::SessionRequired => Status::Unauthorized,
            PipelineError::SessionNotFound(_) => Status::NotFound,
        }
    }

    /// Errors after which no later pipeline stage can run.
    pub fn halts_pipeline(&self) -> bool {
        matches!(
            self,
            PipelineError::UnrecognizedUrl(_)
                | PipelineError::VideoNotFound(_)
                | PipelineError::MetadataFetchFailed(_)
        )
    }
}
