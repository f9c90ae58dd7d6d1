use crate::error::PipelineError;
use crate::models::VideoRef;
use url::Url;

/// Extract the video id from a `youtu.be/<id>` short link or a `youtube.com/watch?v=<id>` URL.
pub fn extract_youtube_video_id(input: &str) -> Result<VideoRef, PipelineError> {
    let trimmed = input.trim();
    let unrecognized = || PipelineError::UnrecognizedUrl(trimmed.to_string());

    // Pasted links often come without a scheme
    let parsed_url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{trimmed}"))
    }
    .map_err(|_| unrecognized())?;

    let host = parsed_url.host_str().ok_or_else(unrecognized)?;

    let video_id = match host {
        "www.youtube.com" | "youtube.com" | "m.youtube.com" => {
            if parsed_url.path() == "/watch" {
                parsed_url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.to_string())
            } else {
                None
            }
        }
        // The whole path after the leading slash is the id
        "youtu.be" => parsed_url
            .path()
            .strip_prefix('/')
            .map(|id| id.to_string()),
        _ => None,
    };

    match video_id {
        Some(id) if !id.is_empty() => Ok(VideoRef::new(id)),
        _ => Err(unrecognized()),
    }
}

/// `<prefix>_<video_id>.csv`, keeping only characters that are safe inside a quoted header value.
pub fn csv_file_name(prefix: &str, video_id: &str) -> String {
    let safe_id: String = video_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}_{safe_id}.csv")
}

/// Cut `text` to at most `max_chars` Unicode scalar values.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// The Data API reports statistics as decimal strings; hidden or garbled values count as zero.
pub fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
