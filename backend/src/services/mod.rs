pub mod pipeline;
pub mod report_service;
pub mod sentiment_service;
pub mod session_service;
#[cfg(test)]
pub mod stubs;
pub mod youtube_service;
