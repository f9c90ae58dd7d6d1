use crate::models::SessionId;
use crate::services::pipeline::Pipeline;
use crate::services::sentiment_service::{HuggingFaceClassifier, SentimentAnnotator};
use crate::services::session_service::SessionStore;
use crate::services::youtube_service::YouTubeClient;
use crate::AppState;
use anyhow::Result;
use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, LevelFilter};
use rocket::http::{Method, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const SESSION_HEADER: &str = "X-Session-Id";

lazy_static! {
    pub static ref YOUTUBE_API_BASE: String = env::var("YOUTUBE_API_BASE")
        .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string());
    pub static ref SENTIMENT_MODEL: String = env::var("SENTIMENT_MODEL")
        .unwrap_or_else(|_| "HamzaEren/sentiment_model_final".to_string());
    pub static ref INFERENCE_API_BASE: String = env::var("INFERENCE_API_BASE")
        .unwrap_or_else(|_| "https://api-inference.huggingface.co/models".to_string());
    pub static ref CLASSIFIER_MAX_CHARS: usize = parse_or(env::var("CLASSIFIER_MAX_CHARS").ok(), 512);
    pub static ref MAX_COMMENTS: u32 = parse_or(env::var("MAX_COMMENTS").ok(), 100);
    pub static ref REQUEST_TIMEOUT_SECS: u64 = parse_or(env::var("REQUEST_TIMEOUT_SECS").ok(), 30);
    pub static ref SESSION_TTL_MINUTES: i64 = parse_or(env::var("SESSION_TTL_MINUTES").ok(), 60);
    pub static ref FRONTEND_ORIGIN: String =
        env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn require_env(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(anyhow::anyhow!("{key} environment variable must be set")),
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub youtube_api_key: String,
    pub youtube_api_base: String,
    pub huggingface_token: String,
    pub sentiment_model: String,
    pub inference_api_base: String,
    pub classifier_max_chars: usize,
    pub max_comments: u32,
    pub request_timeout: Duration,
    pub session_ttl: chrono::Duration,
    pub frontend_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(AppConfig {
            youtube_api_key: require_env("YOUTUBE_API_KEY")?,
            youtube_api_base: YOUTUBE_API_BASE.clone(),
            huggingface_token: require_env("HUGGINGFACE_TOKEN")?,
            sentiment_model: SENTIMENT_MODEL.clone(),
            inference_api_base: INFERENCE_API_BASE.clone(),
            classifier_max_chars: (*CLASSIFIER_MAX_CHARS).max(1),
            max_comments: *MAX_COMMENTS,
            request_timeout: Duration::from_secs(*REQUEST_TIMEOUT_SECS),
            session_ttl: chrono::Duration::minutes(*SESSION_TTL_MINUTES),
            frontend_origin: FRONTEND_ORIGIN.clone(),
        })
    }
}

pub fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
    info!("Starting comment sentiment backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn create_app_state(config: &AppConfig) -> Result<AppState> {
    let source = YouTubeClient::new(
        &config.youtube_api_key,
        &config.youtube_api_base,
        config.request_timeout,
    )?;
    let classifier = HuggingFaceClassifier::new(
        &config.inference_api_base,
        &config.sentiment_model,
        &config.huggingface_token,
        config.request_timeout,
    )?;
    info!(
        "Using sentiment model {} (max {} chars), {} comments per video",
        config.sentiment_model, config.classifier_max_chars, config.max_comments
    );

    let annotator = SentimentAnnotator::new(Arc::new(classifier), config.classifier_max_chars);
    let pipeline = Pipeline::new(Arc::new(source), annotator, config.max_comments);

    Ok(AppState {
        pipeline,
        sessions: SessionStore::new(config.session_ttl),
    })
}

pub fn create_cors(frontend_origin: &str) -> Result<rocket_cors::Cors> {
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[frontend_origin]))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Delete, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&[
            SESSION_HEADER,
            "Accept",
            "Content-Type",
        ]))
        .expose_headers(["Content-Disposition".to_string()].into_iter().collect())
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionId {
    type Error = &'static str;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Download links cannot carry headers, so the query parameter is accepted too
        let session = request
            .headers()
            .get_one(SESSION_HEADER)
            .or_else(|| request.query_value::<&str>("session").and_then(|v| v.ok()))
            .map(str::trim)
            .filter(|s| !s.is_empty());

        match session {
            Some(id) => Outcome::Success(SessionId(id.to_string())),
            None => Outcome::Error((Status::Unauthorized, "Missing session id")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_with_fallback() {
        assert_eq!(parse_or(Some("250".to_string()), 512usize), 250);
        assert_eq!(parse_or(Some(" 40 ".to_string()), 100u32), 40);
        assert_eq!(parse_or(Some("lots".to_string()), 100u32), 100);
        assert_eq!(parse_or(None, 30u64), 30);
    }

    #[test]
    fn cors_accepts_the_session_header() {
        assert!(create_cors("http://localhost:8080").is_ok());
    }
}
