pub mod analyze;
pub mod session;
pub mod video;

pub use analyze::*;
pub use session::*;
pub use video::*;

use crate::error::PipelineError;
use crate::models::ErrorResponse;
use rocket::catch;
use rocket::http::Status;

#[catch(401)]
pub fn unauthorized() -> ErrorResponse {
    PipelineError::SessionRequired.into()
}

#[catch(404)]
pub fn not_found() -> ErrorResponse {
    ErrorResponse::new(Status::NotFound, "not_found", "No such route")
}

#[catch(422)]
pub fn unprocessable() -> ErrorResponse {
    ErrorResponse::new(
        Status::UnprocessableEntity,
        "invalid_request",
        "Request body could not be parsed",
    )
}
