use crate::error::PipelineError;
use crate::models::{
    AnnotatedComment, Comment, PipelineReport, PipelineStage, SummaryResponse, VideoMetadata,
    VideoRef, COMPLETE_MESSAGE,
};
use crate::services::report_service::summary_response;
use crate::services::sentiment_service::SentimentAnnotator;
use crate::services::session_service::SessionContext;
use crate::services::youtube_service::VideoSource;
use crate::utils::extract_youtube_video_id;
use log::{error, info};
use std::sync::Arc;

/// URL → metadata → comments → sentiment → summary.
///
/// Every stage is memoized in the [`SessionContext`] by video id, so calling a stage again
/// for the same video costs nothing. Dropping the cached entry re-triggers it.
pub struct Pipeline {
    source: Arc<dyn VideoSource>,
    annotator: SentimentAnnotator,
    max_comments: u32,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn VideoSource>,
        annotator: SentimentAnnotator,
        max_comments: u32,
    ) -> Self {
        Pipeline {
            source,
            annotator,
            max_comments,
        }
    }

    pub fn resolve(&self, url: &str) -> Result<VideoRef, PipelineError> {
        let video = extract_youtube_video_id(url)?;
        info!("Resolved {url} to video {}", video.id);
        Ok(video)
    }

    pub async fn metadata(
        &self,
        context: &mut SessionContext,
        video: &VideoRef,
    ) -> Result<VideoMetadata, PipelineError> {
        if let Some(metadata) = context.metadata(&video.id) {
            return Ok(metadata.clone());
        }

        let metadata = self
            .source
            .fetch_metadata(video)
            .await?
            .ok_or_else(|| PipelineError::VideoNotFound(video.id.clone()))?;

        info!(
            "Video {}: \"{}\" by {} ({} likes, {} comments)",
            metadata.id,
            metadata.title,
            metadata.channel,
            metadata.like_count,
            metadata.comment_count
        );
        context.store_metadata(metadata.clone());
        Ok(metadata)
    }

    pub async fn comments(
        &self,
        context: &mut SessionContext,
        video: &VideoRef,
    ) -> Result<Vec<Comment>, PipelineError> {
        if let Some(comments) = context.comments(&video.id) {
            return Ok(comments.clone());
        }

        let comments = self
            .source
            .fetch_comments(video, self.max_comments)
            .await?;
        context.store_comments(&video.id, comments.clone());
        Ok(comments)
    }

    pub async fn sentiment(
        &self,
        context: &mut SessionContext,
        video: &VideoRef,
    ) -> Result<Vec<AnnotatedComment>, PipelineError> {
        if let Some(annotated) = context.annotated(&video.id) {
            return Ok(annotated.clone());
        }

        let comments = self.comments(context, video).await?;
        let annotated = self.annotator.annotate(&comments).await;
        context.store_annotated(&video.id, annotated.clone());
        Ok(annotated)
    }

    pub async fn summary(
        &self,
        context: &mut SessionContext,
        video: &VideoRef,
    ) -> Result<SummaryResponse, PipelineError> {
        let annotated = self.sentiment(context, video).await?;
        Ok(summary_response(&annotated))
    }

    /// Runs every stage in order.
    ///
    /// Errors that halt the pipeline (bad URL, missing video, metadata failure) are returned as
    /// errors. Any later failure still returns a report holding what was fetched so far, with
    /// `failed_stage` set.
    pub async fn run(
        &self,
        context: &mut SessionContext,
        url: &str,
    ) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport {
            video_id: String::new(),
            progress: 0,
            status: PipelineStage::Resolve.running_message().to_string(),
            failed_stage: None,
            metadata: None,
            comments: Vec::new(),
            annotated: Vec::new(),
            summary: None,
        };

        let video = match self.resolve(url) {
            Ok(video) => video,
            Err(e) => return stop(report, PipelineStage::Resolve, e),
        };
        report.video_id = video.id.clone();
        complete(&mut report, PipelineStage::Resolve, PipelineStage::Metadata);

        match self.metadata(context, &video).await {
            Ok(metadata) => report.metadata = Some(metadata),
            Err(e) => return stop(report, PipelineStage::Metadata, e),
        }
        complete(&mut report, PipelineStage::Metadata, PipelineStage::Comments);

        match self.comments(context, &video).await {
            Ok(comments) => report.comments = comments,
            Err(e) => return stop(report, PipelineStage::Comments, e),
        }
        complete(&mut report, PipelineStage::Comments, PipelineStage::Sentiment);

        match self.sentiment(context, &video).await {
            Ok(annotated) => report.annotated = annotated,
            Err(e) => return stop(report, PipelineStage::Sentiment, e),
        }
        complete(&mut report, PipelineStage::Sentiment, PipelineStage::Summary);

        match self.summary(context, &video).await {
            Ok(summary) => report.summary = Some(summary),
            Err(e) => return stop(report, PipelineStage::Summary, e),
        }
        report.progress = PipelineStage::Summary.progress();
        report.status = COMPLETE_MESSAGE.to_string();

        info!(
            "Pipeline for video {} finished with {} comments",
            video.id,
            report.annotated.len()
        );
        Ok(report)
    }
}

fn complete(report: &mut PipelineReport, done: PipelineStage, next: PipelineStage) {
    info!(
        "Video {}: {done:?} stage done, {}",
        report.video_id,
        next.running_message()
    );
    report.progress = done.progress();
    report.status = next.running_message().to_string();
}

fn stop(
    mut report: PipelineReport,
    stage: PipelineStage,
    e: PipelineError,
) -> Result<PipelineReport, PipelineError> {
    if e.halts_pipeline() {
        return Err(e);
    }

    error!("Pipeline for video {} stopped at {stage:?}: {e}", report.video_id);
    report.status = e.to_string();
    report.failed_stage = Some(stage);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;
    use crate::services::stubs::{sample_comment, KeywordClassifier, StubSource};

    fn pipeline_with(source: Arc<StubSource>) -> Pipeline {
        let annotator = SentimentAnnotator::new(Arc::new(KeywordClassifier::default()), 512);
        Pipeline::new(source, annotator, 100)
    }

    fn three_comments() -> Vec<Comment> {
        vec![
            sample_comment("@a", "good video"),
            sample_comment("@b", "really good"),
            sample_comment("@c", "bad sound"),
        ]
    }

    #[rocket::async_test]
    async fn full_run_reaches_one_hundred_percent() {
        let pipeline = pipeline_with(Arc::new(StubSource::new("ABC123", three_comments())));
        let mut context = SessionContext::new();

        let report = pipeline
            .run(&mut context, "https://www.youtube.com/watch?v=ABC123")
            .await
            .unwrap();

        assert_eq!(report.video_id, "ABC123");
        assert_eq!(report.progress, 100);
        assert_eq!(report.failed_stage, None);
        assert_eq!(report.comments.len(), 3);
        let summary = report.summary.unwrap().summary;
        assert_eq!(summary.positive_count, 2);
        assert_eq!(summary.negative_count, 1);
        assert_eq!(summary.positive_percent, 66.7);
        assert_eq!(summary.negative_percent, 33.3);
    }

    #[rocket::async_test]
    async fn stages_are_memoized_per_video() {
        let source = Arc::new(StubSource::new("ABC123", three_comments()));
        let pipeline = pipeline_with(source.clone());
        let mut context = SessionContext::new();
        let video = VideoRef::new("ABC123");

        pipeline.comments(&mut context, &video).await.unwrap();
        pipeline.comments(&mut context, &video).await.unwrap();
        pipeline.sentiment(&mut context, &video).await.unwrap();
        pipeline.summary(&mut context, &video).await.unwrap();
        assert_eq!(source.comment_calls(), 1);

        context.invalidate_comments(&video.id);
        pipeline.comments(&mut context, &video).await.unwrap();
        assert_eq!(source.comment_calls(), 2);
    }

    #[rocket::async_test]
    async fn unrecognized_url_halts() {
        let pipeline = pipeline_with(Arc::new(StubSource::new("ABC123", three_comments())));
        let mut context = SessionContext::new();

        let result = pipeline
            .run(&mut context, "https://example.com/watch?v=ABC123")
            .await;
        assert!(matches!(result, Err(PipelineError::UnrecognizedUrl(_))));
        assert_eq!(context.cached_videos(), 0);
    }

    #[rocket::async_test]
    async fn missing_video_halts() {
        let pipeline = pipeline_with(Arc::new(StubSource::new("ABC123", three_comments())));
        let mut context = SessionContext::new();

        let result = pipeline.run(&mut context, "https://youtu.be/XYZ789").await;
        assert_eq!(
            result,
            Err(PipelineError::VideoNotFound("XYZ789".to_string()))
        );
    }

    #[rocket::async_test]
    async fn comment_failure_keeps_metadata() {
        let pipeline = pipeline_with(Arc::new(StubSource::failing_comments("ABC123")));
        let mut context = SessionContext::new();

        let report = pipeline
            .run(&mut context, "https://youtu.be/ABC123")
            .await
            .unwrap();

        assert_eq!(report.progress, 50);
        assert_eq!(report.failed_stage, Some(PipelineStage::Comments));
        assert!(report.status.contains("quota exceeded"));
        assert_eq!(report.metadata.unwrap().title, "Stub Video");
        assert!(report.summary.is_none());
        assert!(context.comments("ABC123").is_none());
    }

    #[rocket::async_test]
    async fn video_without_comments_summarizes_to_zero() {
        let pipeline = pipeline_with(Arc::new(StubSource::new("ABC123", Vec::new())));
        let mut context = SessionContext::new();

        let report = pipeline
            .run(&mut context, "https://youtu.be/ABC123")
            .await
            .unwrap();

        assert_eq!(report.progress, 100);
        let summary = report.summary.unwrap();
        assert_eq!(summary.summary.total, 0);
        assert!(summary.chart.iter().all(|slice| slice.percent == 0.0));
    }

    #[rocket::async_test]
    async fn failed_classification_marks_row_unknown() {
        let comments = vec![
            sample_comment("@a", "good"),
            sample_comment("@b", "fail please"),
        ];
        let pipeline = pipeline_with(Arc::new(StubSource::new("ABC123", comments)));
        let mut context = SessionContext::new();

        let annotated = pipeline
            .sentiment(&mut context, &VideoRef::new("ABC123"))
            .await
            .unwrap();
        assert_eq!(annotated[0].label, SentimentLabel::Positive);
        assert_eq!(annotated[1].label, SentimentLabel::Unknown);
    }

    #[rocket::async_test]
    async fn rerun_reuses_cached_stages() {
        let source = Arc::new(StubSource::new("ABC123", three_comments()));
        let pipeline = pipeline_with(source.clone());
        let mut context = SessionContext::new();

        pipeline
            .run(&mut context, "https://youtu.be/ABC123")
            .await
            .unwrap();
        let report = pipeline
            .run(&mut context, "https://www.youtube.com/watch?v=ABC123")
            .await
            .unwrap();

        assert_eq!(report.progress, 100);
        assert_eq!(report.status, COMPLETE_MESSAGE);
        assert_eq!(source.metadata_calls(), 1);
        assert_eq!(source.comment_calls(), 1);
    }

    #[test]
    fn stop_keeps_non_halting_failures_in_the_report() {
        let report = PipelineReport {
            video_id: "ABC123".to_string(),
            progress: PipelineStage::Comments.progress(),
            status: PipelineStage::Sentiment.running_message().to_string(),
            failed_stage: None,
            metadata: None,
            comments: Vec::new(),
            annotated: Vec::new(),
            summary: None,
        };

        let stopped = stop(
            report.clone(),
            PipelineStage::Sentiment,
            PipelineError::ClassificationFailed("HTTP 503".to_string()),
        )
        .unwrap();
        assert_eq!(stopped.failed_stage, Some(PipelineStage::Sentiment));
        assert_eq!(stopped.progress, 75);
        assert_eq!(stopped.status, "Classification failed: HTTP 503");

        assert_eq!(
            stop(
                report,
                PipelineStage::Metadata,
                PipelineError::MetadataFetchFailed("HTTP 500".to_string())
            ),
            Err(PipelineError::MetadataFetchFailed("HTTP 500".to_string()))
        );
    }
}
