use crate::api::session::open_session;
use crate::models::{AnalyzeRequest, ErrorResponse, PipelineReport, SessionId};
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{post, State};

/// Runs the whole pipeline for one URL. Re-running is cheap: every stage is cached in the session.
#[post("/", data = "<request>")]
pub async fn analyze_url(
    session: SessionId,
    state: &State<AppState>,
    request: Json<AnalyzeRequest>,
) -> Result<Json<PipelineReport>, ErrorResponse> {
    let shared = open_session(state, &session)?;
    let mut context = shared.lock().await;

    info!("Session {}: analyzing {}", session.0, request.url);
    let report = state.pipeline.run(&mut context, &request.url).await?;
    Ok(Json(report))
}
