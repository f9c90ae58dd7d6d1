use crate::models::{
    AnnotatedComment, ChartSlice, Comment, SentimentLabel, SentimentSummary, SummaryResponse,
};
use crate::utils::round_to_tenth;
use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;

/// Lets spreadsheet tools detect UTF-8.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const COMMENTS_HEADER: [&str; 5] = ["author", "text", "likeCount", "publishedAt", "replyCount"];
pub const SENTIMENT_HEADER: [&str; 3] = ["text", "label", "percent"];

pub const CHART_TITLE: &str = "Comment sentiment distribution";

#[derive(Serialize)]
struct CommentRow<'a> {
    author: &'a str,
    text: &'a str,
    like_count: u64,
    published_at: &'a str,
    reply_count: u64,
}

#[derive(Serialize)]
struct SentimentRow<'a> {
    text: &'a str,
    label: &'a str,
    percent: f64,
}

/// Share of `count` in `total`, in percent with one decimal; an empty total gives 0.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to_tenth(count as f64 / total as f64 * 100.0)
}

pub fn summarize(annotated: &[AnnotatedComment]) -> SentimentSummary {
    let count = |label: SentimentLabel| annotated.iter().filter(|a| a.label == label).count();

    let total = annotated.len();
    let positive_count = count(SentimentLabel::Positive);
    let neutral_count = count(SentimentLabel::Neutral);
    let negative_count = count(SentimentLabel::Negative);
    let unscored_count = count(SentimentLabel::Unknown);

    SentimentSummary {
        positive_count,
        neutral_count,
        negative_count,
        unscored_count,
        total,
        positive_percent: percent(positive_count, total),
        neutral_percent: percent(neutral_count, total),
        negative_percent: percent(negative_count, total),
        unscored_percent: percent(unscored_count, total),
    }
}

/// Pie slices in display order; the unscored slice only appears when some rows failed.
pub fn chart_slices(summary: &SentimentSummary) -> Vec<ChartSlice> {
    let mut slices = vec![
        (SentimentLabel::Positive, summary.positive_percent),
        (SentimentLabel::Neutral, summary.neutral_percent),
        (SentimentLabel::Negative, summary.negative_percent),
    ];
    if summary.unscored_count > 0 {
        slices.push((SentimentLabel::Unknown, summary.unscored_percent));
    }

    slices
        .into_iter()
        .map(|(label, percent)| ChartSlice {
            label,
            name: label.display_name().to_string(),
            percent,
            color: label.chart_color().to_string(),
        })
        .collect()
}

pub fn summary_response(annotated: &[AnnotatedComment]) -> SummaryResponse {
    let summary = summarize(annotated);
    SummaryResponse {
        title: CHART_TITLE.to_string(),
        chart: chart_slices(&summary),
        summary,
    }
}

fn write_csv<R: Serialize>(header: &[&str], rows: impl IntoIterator<Item = R>) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(UTF8_BOM.to_vec());

    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV export: {}", e.error()))
}

/// `author,text,likeCount,publishedAt,replyCount`, UTF-8 with BOM.
pub fn export_comments_csv(comments: &[Comment]) -> Result<Vec<u8>> {
    write_csv(
        &COMMENTS_HEADER,
        comments.iter().map(|c| CommentRow {
            author: &c.author,
            text: &c.text,
            like_count: c.like_count,
            published_at: &c.published_at,
            reply_count: c.reply_count,
        }),
    )
}

/// `text,label,percent`, UTF-8 with BOM. `percent` is the classifier confidence.
pub fn export_sentiment_csv(annotated: &[AnnotatedComment]) -> Result<Vec<u8>> {
    write_csv(
        &SENTIMENT_HEADER,
        annotated.iter().map(|a| SentimentRow {
            text: &a.comment.text,
            label: a.label.as_str(),
            percent: a.score,
        }),
    )
}
