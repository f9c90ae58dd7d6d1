#[macro_use]
extern crate rocket;

mod api;
mod config;
mod error;
mod models;
mod services;
mod utils;

use crate::config::{create_app_state, create_cors, init_logger, load_environment, AppConfig};
use crate::services::pipeline::Pipeline;
use crate::services::session_service::SessionStore;
use rocket::{Build, Rocket};

pub struct AppState {
    pub pipeline: Pipeline,
    pub sessions: SessionStore,
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/session", routes![api::create_session, api::delete_session])
        .mount("/analyze", routes![api::analyze_url])
        .mount(
            "/video",
            routes![
                api::resolve_video,
                api::get_video_metadata,
                api::get_comments,
                api::get_sentiment,
                api::get_summary,
                api::download_comments_csv,
                api::download_sentiment_csv,
            ],
        )
        .register(
            "/",
            catchers![api::unauthorized, api::not_found, api::unprocessable],
        )
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    load_environment();
    init_logger();

    let config = AppConfig::from_env()?;
    let cors = create_cors(&config.frontend_origin)?;
    let state = create_app_state(&config)?;

    build_rocket(state)
        .attach(cors)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket failed: {e}"))?;

    Ok(())
}
