use crate::error::PipelineError;
use crate::models::{ErrorResponse, SessionId, SessionResponse};
use crate::services::session_service::SharedSession;
use crate::AppState;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, post, State};

/// Look up the caller's session, or fail with `SessionNotFound`.
pub fn open_session(state: &AppState, session: &SessionId) -> Result<SharedSession, ErrorResponse> {
    state
        .sessions
        .get(&session.0)
        .ok_or_else(|| PipelineError::SessionNotFound(session.0.clone()).into())
}

#[post("/")]
pub async fn create_session(state: &State<AppState>) -> (Status, Json<SessionResponse>) {
    let session_id = state.sessions.create();
    (Status::Created, Json(SessionResponse { session_id }))
}

#[delete("/<session_id>")]
pub async fn delete_session(
    session_id: &str,
    state: &State<AppState>,
) -> Result<Status, ErrorResponse> {
    if state.sessions.remove(session_id) {
        Ok(Status::NoContent)
    } else {
        Err(PipelineError::SessionNotFound(session_id.to_string()).into())
    }
}
