use crate::api::session::open_session;
use crate::models::{
    AnnotatedComment, Comment, CsvDownload, ErrorResponse, SessionId, SummaryResponse,
    VideoMetadata, VideoRef,
};
use crate::services::report_service::{export_comments_csv, export_sentiment_csv};
use crate::utils::csv_file_name;
use crate::AppState;
use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};

fn export_failed(e: anyhow::Error) -> ErrorResponse {
    error!("CSV export failed: {e:?}");
    ErrorResponse::new(
        Status::InternalServerError,
        "export_failed",
        "Failed to build CSV export",
    )
}

#[get("/resolve?<url>")]
pub async fn resolve_video(
    session: SessionId,
    state: &State<AppState>,
    url: &str,
) -> Result<Json<VideoRef>, ErrorResponse> {
    open_session(state, &session)?;
    Ok(Json(state.pipeline.resolve(url)?))
}

#[get("/<id>?<refresh>")]
pub async fn get_video_metadata(
    session: SessionId,
    state: &State<AppState>,
    id: &str,
    refresh: Option<bool>,
) -> Result<Json<VideoMetadata>, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;
    if refresh.unwrap_or(false) {
        context.invalidate_video(id);
    }

    let metadata = state.pipeline.metadata(&mut context, &VideoRef::new(id)).await?;
    Ok(Json(metadata))
}

#[get("/<id>/comments?<refresh>")]
pub async fn get_comments(
    session: SessionId,
    state: &State<AppState>,
    id: &str,
    refresh: Option<bool>,
) -> Result<Json<Vec<Comment>>, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;
    if refresh.unwrap_or(false) {
        context.invalidate_comments(id);
    }

    let comments = state.pipeline.comments(&mut context, &VideoRef::new(id)).await?;
    Ok(Json(comments))
}

#[get("/<id>/sentiment?<refresh>")]
pub async fn get_sentiment(
    session: SessionId,
    state: &State<AppState>,
    id: &str,
    refresh: Option<bool>,
) -> Result<Json<Vec<AnnotatedComment>>, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;
    if refresh.unwrap_or(false) {
        context.invalidate_annotated(id);
    }

    let annotated = state.pipeline.sentiment(&mut context, &VideoRef::new(id)).await?;
    Ok(Json(annotated))
}

#[get("/<id>/summary")]
pub async fn get_summary(
    session: SessionId,
    state: &State<AppState>,
    id: &str,
) -> Result<Json<SummaryResponse>, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;

    let summary = state.pipeline.summary(&mut context, &VideoRef::new(id)).await?;
    Ok(Json(summary))
}

#[get("/<id>/comments.csv")]
pub async fn download_comments_csv(
    session: SessionId,
    state: &State<AppState>,
    id: &str,
) -> Result<CsvDownload, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;

    let comments = state.pipeline.comments(&mut context, &VideoRef::new(id)).await?;
    Ok(CsvDownload {
        file_name: csv_file_name("comments", id),
        body: export_comments_csv(&comments).map_err(export_failed)?,
    })
}

#[get("/<id>/sentiment.csv")]
pub async fn download_sentiment_csv(
    session: SessionId,
    state: &State<AppState>,
    id: &str,
) -> Result<CsvDownload, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;

    let annotated = state.pipeline.sentiment(&mut context, &VideoRef::new(id)).await?;
    Ok(CsvDownload {
        file_name: csv_file_name("sentiment", id),
        body: export_sentiment_csv(&annotated).map_err(export_failed)?,
    })
}
