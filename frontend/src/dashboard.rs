pub mod api;
pub mod components;

use crate::dashboard::api::{
    create_session, fetch_comments, fetch_metadata, fetch_sentiment, fetch_summary,
    resolve_video, ApiError,
};
use crate::dashboard::components::{
    DownloadLinks, ErrorMessage, ProgressPanel, SentimentPie, SentimentTable, UrlForm, VideoCard,
};
use crate::env_variable_utils::APP_NAME;
use crate::models::{AnnotatedComment, SummaryResponse, VideoMetadata};
use yew::prelude::*;

pub const WAITING_MESSAGE: &str = "Waiting for a URL...";
pub const FETCHING_INFO_MESSAGE: &str = "Fetching video info...";
pub const FETCHING_COMMENTS_MESSAGE: &str = "Fetching comments...";
pub const ANALYSING_MESSAGE: &str = "Analysing comment sentiment...";
pub const COMPLETE_MESSAGE: &str = "Sentiment analysis complete.";

/// Everything the dashboard renders for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub progress: u8,
    pub status: String,
    pub loading: bool,
    pub error: Option<String>,
    pub video_id: Option<String>,
    pub metadata: Option<VideoMetadata>,
    pub comments_ready: bool,
    pub rows: Vec<AnnotatedComment>,
    pub summary: Option<SummaryResponse>,
}

impl Default for DashboardView {
    fn default() -> Self {
        DashboardView {
            progress: 0,
            status: WAITING_MESSAGE.to_string(),
            loading: false,
            error: None,
            video_id: None,
            metadata: None,
            comments_ready: false,
            rows: Vec::new(),
            summary: None,
        }
    }
}

impl DashboardView {
    pub fn started() -> Self {
        DashboardView {
            status: FETCHING_INFO_MESSAGE.to_string(),
            loading: true,
            ..DashboardView::default()
        }
    }

    pub fn advance(&mut self, progress: u8, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }

    /// Stops the run before any video is known: nothing partial stays on screen.
    pub fn halt(&mut self, message: String) {
        *self = DashboardView {
            status: message.clone(),
            error: Some(message),
            ..DashboardView::default()
        };
    }

    /// Stops a later stage. Progress and the results fetched so far stay visible.
    pub fn stop(&mut self, message: String) {
        self.status = message.clone();
        self.error = Some(message);
        self.loading = false;
    }
}

async fn open_session(session: &UseStateHandle<Option<String>>) -> Result<String, ApiError> {
    let session_id = create_session().await?;
    session.set(Some(session_id.clone()));
    Ok(session_id)
}

/// Ends the run on a failed stage. An expired session is dropped so the next run opens a new one.
fn fail(
    session: &UseStateHandle<Option<String>>,
    view_handle: &UseStateHandle<DashboardView>,
    mut view: DashboardView,
    error: ApiError,
    halts: bool,
) {
    web_sys::console::error_1(&error.message.clone().into());
    if error.session_expired() {
        session.set(None);
    }
    if halts {
        view.halt(error.message);
    } else {
        view.stop(error.message);
    }
    view_handle.set(view);
}

async fn run_analysis(
    url: String,
    session: UseStateHandle<Option<String>>,
    view_handle: UseStateHandle<DashboardView>,
) {
    let mut view = DashboardView::started();
    view_handle.set(view.clone());

    let stored = (*session).clone();
    let mut session_id = match stored {
        Some(id) => id,
        None => match open_session(&session).await {
            Ok(id) => id,
            Err(e) => return fail(&session, &view_handle, view, e, true),
        },
    };

    let mut resolved = resolve_video(&session_id, &url).await;
    if matches!(&resolved, Err(e) if e.session_expired()) {
        log::info!("Session expired, opening a new one");
        session_id = match open_session(&session).await {
            Ok(id) => id,
            Err(e) => return fail(&session, &view_handle, view, e, true),
        };
        resolved = resolve_video(&session_id, &url).await;
    }
    let video = match resolved {
        Ok(video) => video,
        Err(e) => return fail(&session, &view_handle, view, e, true),
    };
    view.video_id = Some(video.id.clone());
    view.advance(25, FETCHING_INFO_MESSAGE);
    view_handle.set(view.clone());

    match fetch_metadata(&session_id, &video.id).await {
        Ok(metadata) => view.metadata = Some(metadata),
        Err(e) => return fail(&session, &view_handle, view, e, true),
    }
    view.advance(50, FETCHING_COMMENTS_MESSAGE);
    view_handle.set(view.clone());

    if let Err(e) = fetch_comments(&session_id, &video.id).await {
        return fail(&session, &view_handle, view, e, false);
    }
    view.comments_ready = true;
    view.advance(75, ANALYSING_MESSAGE);
    view_handle.set(view.clone());

    match fetch_sentiment(&session_id, &video.id).await {
        Ok(rows) => view.rows = rows,
        Err(e) => return fail(&session, &view_handle, view, e, false),
    }

    match fetch_summary(&session_id, &video.id).await {
        Ok(summary) => view.summary = Some(summary),
        Err(e) => return fail(&session, &view_handle, view, e, false),
    }

    view.advance(100, COMPLETE_MESSAGE);
    view.loading = false;
    log::info!("Analysed {} comments for video {}", view.rows.len(), video.id);
    view_handle.set(view);
}

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let session = use_state(|| None::<String>);
    let view = use_state(DashboardView::default);

    let on_submit = {
        let session = session.clone();
        let view = view.clone();
        Callback::from(move |url: String| {
            let session = session.clone();
            let view = view.clone();
            wasm_bindgen_futures::spawn_local(async move {
                run_analysis(url, session, view).await;
            });
        })
    };

    let current = (*view).clone();
    let session_id = (*session).clone().unwrap_or_default();

    html! {
        <div class="min-h-screen flex flex-col items-center bg-gray-700 p-4">
            <div class="bg-white p-8 rounded-lg shadow-lg w-full max-w-3xl">
                <h1 class="text-3xl font-bold text-center text-gray-800 mb-6">
                    { APP_NAME.as_str() }
                </h1>

                <UrlForm loading={current.loading} on_submit={on_submit} />

                <ProgressPanel
                    progress={current.progress}
                    status={current.status.clone()}
                    failed={current.error.is_some()}
                />

                {
                    if let Some(message) = &current.error {
                        html! { <ErrorMessage message={message.clone()} /> }
                    } else {
                        html! {}
                    }
                }

                {
                    if let Some(metadata) = &current.metadata {
                        html! { <VideoCard metadata={metadata.clone()} /> }
                    } else {
                        html! {}
                    }
                }

                {
                    match (&current.video_id, current.comments_ready) {
                        (Some(video_id), true) => html! {
                            <DownloadLinks
                                session_id={session_id.clone()}
                                video_id={video_id.clone()}
                                sentiment_ready={current.summary.is_some()}
                            />
                        },
                        _ => html! {},
                    }
                }

                {
                    if let Some(summary) = &current.summary {
                        html! {
                            <>
                                <SentimentPie summary={summary.clone()} />
                                <SentimentTable rows={current.rows.clone()} />
                            </>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            id: "ABC123".to_string(),
            url: "https://www.youtube.com/watch?v=ABC123".to_string(),
            title: "Stub Video".to_string(),
            channel: "Stub Channel".to_string(),
            thumbnail_url: "https://i.ytimg.com/vi/ABC123/hqdefault.jpg".to_string(),
            like_count: 10,
            comment_count: 3,
        }
    }

    #[test]
    fn starts_waiting_at_zero() {
        let view = DashboardView::default();
        assert_eq!(view.progress, 0);
        assert_eq!(view.status, WAITING_MESSAGE);
        assert!(!view.loading);
    }

    #[test]
    fn halting_clears_partial_results() {
        let mut view = DashboardView::started();
        view.video_id = Some("ABC123".to_string());
        view.metadata = Some(metadata());
        view.advance(25, FETCHING_INFO_MESSAGE);

        view.halt("Video not found: ABC123".to_string());

        assert_eq!(view.progress, 0);
        assert!(view.metadata.is_none());
        assert!(view.video_id.is_none());
        assert_eq!(view.error.as_deref(), Some("Video not found: ABC123"));
        assert!(!view.loading);
    }

    #[test]
    fn stopping_keeps_metadata_visible() {
        let mut view = DashboardView::started();
        view.metadata = Some(metadata());
        view.advance(50, FETCHING_COMMENTS_MESSAGE);

        view.stop("Failed to fetch comments: quota exceeded".to_string());

        assert_eq!(view.progress, 50);
        assert_eq!(view.metadata, Some(metadata()));
        assert_eq!(view.status, "Failed to fetch comments: quota exceeded");
        assert!(!view.loading);
    }
}
