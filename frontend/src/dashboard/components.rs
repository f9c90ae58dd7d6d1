use crate::dashboard::api::{download_url, CsvKind};
use crate::models::{AnnotatedComment, SummaryResponse, VideoMetadata};
use crate::utils::{
    format_iso8601_date, format_number, format_percent, pie_segments, PieShape, PIE_CENTER,
    PIE_RADIUS,
};
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct UrlFormProps {
    pub loading: bool,
    pub on_submit: Callback<String>,
}

#[function_component(UrlForm)]
pub fn url_form(props: &UrlFormProps) -> Html {
    let current_input = use_state(String::new);

    let on_input = {
        let current_input = current_input.clone();
        Callback::from(move |e: InputEvent| {
            let input_value = e.target_unchecked_into::<HtmlInputElement>().value();
            current_input.set(input_value);
        })
    };

    let on_submit = {
        let on_submit = props.on_submit.clone();
        let current_input = current_input.clone();
        Callback::from(move |e: web_sys::SubmitEvent| {
            e.prevent_default();
            on_submit.emit((*current_input).trim().to_string());
        })
    };

    html! {
        <form onsubmit={on_submit} class="flex mb-4">
            <input
                type="text"
                class="flex-grow p-3 border border-gray-300 rounded-l-lg focus:outline-none focus:ring-2 focus:ring-blue-500"
                placeholder="Paste a YouTube video URL..."
                value={(*current_input).clone()}
                oninput={on_input}
                disabled={props.loading}
            />
            <button
                type="submit"
                class="bg-blue-600 text-white p-3 rounded-r-lg hover:bg-blue-700 focus:outline-none focus:ring-2 focus:ring-blue-500 disabled:opacity-50"
                disabled={props.loading}
            >
                { if props.loading { "Analysing..." } else { "Analyse" } }
            </button>
        </form>
    }
}

#[derive(Properties, PartialEq)]
pub struct ProgressPanelProps {
    pub progress: u8,
    pub status: String,
    pub failed: bool,
}

#[function_component(ProgressPanel)]
pub fn progress_panel(props: &ProgressPanelProps) -> Html {
    let bar_class = if props.failed {
        "bg-red-500 h-3 rounded-full"
    } else {
        "bg-blue-600 h-3 rounded-full"
    };

    html! {
        <div class="mb-6">
            <div class="w-full bg-gray-200 rounded-full h-3">
                <div class={bar_class} style={format!("width: {}%", props.progress)}></div>
            </div>
            <p class="text-sm text-gray-600 mt-2">
                { format!("{}% - {}", props.progress, props.status) }
            </p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ErrorMessageProps {
    pub message: String,
}

#[function_component(ErrorMessage)]
pub fn error_message(props: &ErrorMessageProps) -> Html {
    html! {
        <div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded mb-4">
            <p>{ format!("Error: {}", props.message) }</p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct VideoCardProps {
    pub metadata: VideoMetadata,
}

#[function_component(VideoCard)]
pub fn video_card(props: &VideoCardProps) -> Html {
    let metadata = &props.metadata;

    html! {
        <div class="bg-gray-100 rounded-lg overflow-hidden mb-6 flex">
            <img src={metadata.thumbnail_url.clone()} alt={metadata.title.clone()} class="w-48 object-cover" />
            <div class="p-4">
                <h2 class="text-lg font-semibold text-gray-800">
                    <a href={metadata.url.clone()} target="_blank" class="text-blue-600 hover:underline">
                        { &metadata.title }
                    </a>
                </h2>
                <p class="text-sm text-gray-600 mt-1">{ format!("📺 {}", metadata.channel) }</p>
                <div class="text-sm flex flex-wrap gap-4 mt-2">
                    <p class="flex items-center">{"👍 "}<span>{ format_number(metadata.like_count) }</span></p>
                    <p class="flex items-center">{"💬 "}<span>{ format_number(metadata.comment_count) }</span></p>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SentimentTableProps {
    pub rows: Vec<AnnotatedComment>,
}

#[function_component(SentimentTable)]
pub fn sentiment_table(props: &SentimentTableProps) -> Html {
    if props.rows.is_empty() {
        return html! {
            <p class="text-center text-gray-500 mb-6">{"This video has no comments."}</p>
        };
    }

    html! {
        <div class="overflow-x-auto mb-6">
            <table class="min-w-full text-sm">
                <thead class="bg-gray-200">
                    <tr>
                        <th class="p-2 text-left">{"Comment"}</th>
                        <th class="p-2 text-left">{"Label"}</th>
                        <th class="p-2 text-right">{"Score"}</th>
                    </tr>
                </thead>
                <tbody class="divide-y divide-gray-200">
                    { for props.rows.iter().map(|row| html! {
                        <tr title={row.error.clone().unwrap_or_default()}>
                            <td class="p-2">
                                <p class="text-gray-800">{ &row.comment.text }</p>
                                <p class="text-xs text-gray-500">
                                    { format!("{} · {}", row.comment.author, format_iso8601_date(&row.comment.published_at)) }
                                </p>
                            </td>
                            <td class="p-2">
                                <span class={classes!("px-2", "py-1", "rounded", row.label.badge_class())}>
                                    { row.label.display_name() }
                                </span>
                            </td>
                            <td class="p-2 text-right">{ format!("{:.2}", row.score) }</td>
                        </tr>
                    })}
                </tbody>
            </table>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct DownloadLinksProps {
    pub session_id: String,
    pub video_id: String,
    pub sentiment_ready: bool,
}

#[function_component(DownloadLinks)]
pub fn download_links(props: &DownloadLinksProps) -> Html {
    let link_class = "bg-blue-600 text-white px-4 py-2 rounded hover:bg-blue-700";

    html! {
        <div class="flex gap-4 mb-6">
            <a class={link_class} href={download_url(&props.session_id, &props.video_id, CsvKind::Comments)}>
                {"Download comments (CSV)"}
            </a>
            {
                if props.sentiment_ready {
                    html! {
                        <a class={link_class} href={download_url(&props.session_id, &props.video_id, CsvKind::Sentiment)}>
                            {"Download sentiment (CSV)"}
                        </a>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SentimentPieProps {
    pub summary: SummaryResponse,
}

#[function_component(SentimentPie)]
pub fn sentiment_pie(props: &SentimentPieProps) -> Html {
    let segments = pie_segments(&props.summary.chart);

    html! {
        <div class="flex flex-col items-center">
            <h3 class="text-lg font-semibold text-gray-800 mb-2">{ &props.summary.title }</h3>
            {
                if segments.is_empty() {
                    html! { <p class="text-gray-500">{"Nothing to chart yet."}</p> }
                } else {
                    html! {
                        <svg width="200" height="200" viewBox="0 0 200 200">
                            { for segments.iter().map(|segment| match &segment.shape {
                                PieShape::Circle => html! {
                                    <circle
                                        cx={PIE_CENTER.to_string()}
                                        cy={PIE_CENTER.to_string()}
                                        r={PIE_RADIUS.to_string()}
                                        fill={segment.color.clone()}
                                    />
                                },
                                PieShape::Path(d) => html! {
                                    <path d={d.clone()} fill={segment.color.clone()} stroke="white" />
                                },
                            })}
                        </svg>
                    }
                }
            }
            <ul class="flex gap-4 mt-2 text-sm">
                { for props.summary.chart.iter().map(|slice| html! {
                    <li class="flex items-center">
                        <span class="inline-block w-3 h-3 mr-1 rounded-sm" style={format!("background-color: {}", slice.color)}></span>
                        { format!("{} {}", slice.name, format_percent(slice.percent)) }
                    </li>
                })}
            </ul>
        </div>
    }
}
