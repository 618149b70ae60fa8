//! Ingestion pipeline
//!
//! Single entry point that turns a raw scraped-comment batch into
//! persisted state: quota check, NLP analysis, aggregation, comment
//! upserts, video snapshot update, usage increment.
//!
//! The steps are an explicit sequence of individually idempotent
//! operations, not a transaction: a failing step aborts the rest but
//! does not roll back earlier writes. Re-running the same ingestion is
//! safe because comment writes are upserts and the video snapshot is
//! overwritten wholesale.

use std::sync::Arc;

use chrono::Utc;

use super::stats;
use super::usage::UsageService;
use crate::data::{Comment, Database, EntityId, StatsSnapshot, Video};
use crate::error::AppError;
use crate::metrics;
use crate::nlp::{CommentAnalyzer, RawComment};

/// Video metadata supplied by the scraper, all optional
#[derive(Debug, Clone, Default)]
pub struct VideoMetadata {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub thumbnail: Option<String>,
    pub url: Option<String>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestionOutcome {
    pub stats: StatsSnapshot,
    pub comment_count: usize,
}

/// Ingestion orchestrator
pub struct IngestionService {
    db: Arc<Database>,
    analyzer: Arc<dyn CommentAnalyzer>,
    usage: UsageService,
}

impl IngestionService {
    /// Create new ingestion service
    pub fn new(db: Arc<Database>, analyzer: Arc<dyn CommentAnalyzer>, usage: UsageService) -> Self {
        Self {
            db,
            analyzer,
            usage,
        }
    }

    /// Ingest one raw comment batch for a (user, video) pair.
    ///
    /// # Sequence
    /// 1. Resolve the user (NotFound if absent)
    /// 2. Free plan quota check (QuotaExceeded, nothing processed)
    /// 3. Validate the raw batch (Validation, before any write)
    /// 4. Resolve or create the video record from request metadata
    /// 5. Delegate to the NLP boundary; the response must be parallel
    ///    to the request batch
    /// 6. Aggregate the analyzed batch into a stats snapshot
    /// 7. Upsert every comment (concurrently; distinct keys)
    /// 8. Overwrite the video's stats/commentCount, replace content
    ///    ideas only if the boundary supplied any
    /// 9. Record usage
    pub async fn ingest(
        &self,
        user_id: &str,
        video_id: &str,
        metadata: VideoMetadata,
        comments: Vec<RawComment>,
    ) -> Result<IngestionOutcome, AppError> {
        let mut user = self.db.get_user(user_id).await?.ok_or(AppError::NotFound)?;

        if self.usage.has_reached_limit(&mut user, Utc::now()).await? {
            metrics::QUOTA_REJECTIONS_TOTAL.inc();
            metrics::INGESTIONS_TOTAL
                .with_label_values(&["quota_exceeded"])
                .inc();
            tracing::warn!(user_id = %user_id, video_id = %video_id, "Ingestion rejected by free plan limit");
            return Err(AppError::QuotaExceeded);
        }

        validate_batch(&comments)?;

        if self.db.get_video(user_id, video_id).await?.is_none() {
            let video = new_video(user_id, video_id, &metadata, comments.len());
            self.db.insert_video(&video).await?;
        }

        let outcome = self
            .analyze_and_persist(user_id, video_id, &comments)
            .await;

        match &outcome {
            Ok(result) => {
                metrics::INGESTIONS_TOTAL.with_label_values(&["success"]).inc();
                metrics::COMMENTS_PROCESSED_TOTAL.inc_by(result.comment_count as u64);
                tracing::info!(
                    user_id = %user_id,
                    video_id = %video_id,
                    comment_count = result.comment_count,
                    "Ingestion completed"
                );
            }
            Err(error) => {
                metrics::INGESTIONS_TOTAL.with_label_values(&["error"]).inc();
                tracing::error!(
                    user_id = %user_id,
                    video_id = %video_id,
                    %error,
                    "Ingestion failed"
                );
            }
        }

        outcome
    }

    /// Steps 5-9: everything past the video record resolution.
    async fn analyze_and_persist(
        &self,
        user_id: &str,
        video_id: &str,
        comments: &[RawComment],
    ) -> Result<IngestionOutcome, AppError> {
        let analysis = self.analyzer.analyze(comments).await?;

        if analysis.comments.len() != comments.len() {
            return Err(AppError::Upstream(format!(
                "NLP service returned {} analyzed comments for a batch of {}",
                analysis.comments.len(),
                comments.len()
            )));
        }

        let snapshot = stats::aggregate(&analysis.comments);

        // Each upsert targets a distinct (video, comment) key, so the
        // writes can run concurrently; all must settle before the video
        // snapshot is overwritten.
        let now = Utc::now();
        let records: Vec<Comment> = analysis
            .comments
            .iter()
            .map(|comment| Comment {
                id: EntityId::new().0,
                comment_id: comment.id.clone(),
                video_id: video_id.to_string(),
                user_id: user_id.to_string(),
                author: comment.author.clone(),
                text: comment.text.clone(),
                timestamp: comment.timestamp.clone(),
                like_count: comment.like_count,
                is_reply: comment.is_reply,
                parent_id: comment.parent_id.clone(),
                analysis: comment.analysis.clone(),
                created_at: now,
            })
            .collect();

        futures::future::try_join_all(records.iter().map(|record| self.db.upsert_comment(record)))
            .await?;

        self.db
            .update_video_snapshot(
                user_id,
                video_id,
                &snapshot,
                comments.len() as i64,
                analysis.content_ideas.as_deref(),
            )
            .await?;

        self.usage.record_analysis(user_id, comments.len()).await?;

        Ok(IngestionOutcome {
            stats: snapshot,
            comment_count: comments.len(),
        })
    }
}

/// Reject malformed raw comments before anything is written or sent
/// upstream.
fn validate_batch(comments: &[RawComment]) -> Result<(), AppError> {
    for (index, comment) in comments.iter().enumerate() {
        if comment.id.trim().is_empty()
            || comment.author.trim().is_empty()
            || comment.text.trim().is_empty()
        {
            return Err(AppError::Validation(format!(
                "comment at index {index} is missing a required id, author, or text"
            )));
        }
    }

    Ok(())
}

/// Build a fresh video record, synthesizing defaults for absent
/// metadata the same way the dashboard expects them.
fn new_video(user_id: &str, video_id: &str, metadata: &VideoMetadata, batch_len: usize) -> Video {
    let now = Utc::now();
    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
    };

    Video {
        id: EntityId::new().0,
        user_id: user_id.to_string(),
        video_id: video_id.to_string(),
        title: non_empty(&metadata.title).unwrap_or_else(|| "Untitled Video".to_string()),
        channel_name: non_empty(&metadata.channel).unwrap_or_else(|| "Unknown Channel".to_string()),
        thumbnail_url: non_empty(&metadata.thumbnail)
            .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{video_id}/mqdefault.jpg")),
        url: non_empty(&metadata.url)
            .unwrap_or_else(|| format!("https://www.youtube.com/watch?v={video_id}")),
        comment_count: batch_len as i64,
        stats: StatsSnapshot::default(),
        content_ideas: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CommentAnalysis, CommentTag, ContentIdea, Sentiment, Subscription, UsageStats};
    use crate::nlp::{AnalysisResponse, AnalyzedComment, MockCommentAnalyzer};
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("ingestion.db");
        let db = Arc::new(Database::connect(&db_path).await.unwrap());
        (db, temp_dir)
    }

    fn create_service(db: Arc<Database>, analyzer: MockCommentAnalyzer) -> IngestionService {
        let usage = UsageService::new(db.clone(), 3);
        IngestionService::new(db, Arc::new(analyzer), usage)
    }

    fn raw(id: &str, author: &str, text: &str) -> RawComment {
        RawComment {
            id: id.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            timestamp: Some("2 weeks ago".to_string()),
            like_count: 4,
            is_reply: false,
            parent_id: None,
        }
    }

    fn echo_with(
        analyses: Vec<CommentAnalysis>,
        content_ideas: Option<Vec<ContentIdea>>,
    ) -> impl Fn(&[RawComment]) -> Result<AnalysisResponse, AppError> + Send {
        move |comments: &[RawComment]| {
            let analyzed = comments
                .iter()
                .zip(analyses.iter().cloned())
                .map(|(comment, analysis)| AnalyzedComment {
                    id: comment.id.clone(),
                    author: comment.author.clone(),
                    text: comment.text.clone(),
                    timestamp: comment.timestamp.clone(),
                    like_count: comment.like_count,
                    is_reply: comment.is_reply,
                    parent_id: comment.parent_id.clone(),
                    analysis,
                })
                .collect();
            Ok(AnalysisResponse {
                comments: analyzed,
                content_ideas: content_ideas.clone(),
            })
        }
    }

    fn analysis(sentiment: Sentiment, tags: Vec<CommentTag>) -> CommentAnalysis {
        CommentAnalysis {
            sentiment,
            tags,
            ..CommentAnalysis::default()
        }
    }

    async fn seed_user(db: &Database, id: &str) {
        db.find_or_create_user(id, &format!("{id}@example.com"), id, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ingest_aggregates_persists_and_records_usage() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer.expect_analyze().returning(echo_with(
            vec![
                analysis(Sentiment::Positive, vec![CommentTag::Praise]),
                analysis(Sentiment::Positive, vec![CommentTag::Question]),
                analysis(Sentiment::Neutral, vec![]),
                analysis(Sentiment::Negative, vec![CommentTag::Complaint]),
                analysis(
                    Sentiment::Positive,
                    vec![CommentTag::Praise, CommentTag::Question],
                ),
            ],
            None,
        ));
        let service = create_service(db.clone(), analyzer);

        let batch = vec![
            raw("c1", "a", "great video"),
            raw("c2", "b", "how did you do this?"),
            raw("c3", "c", "first"),
            raw("c4", "d", "audio is too quiet"),
            raw("c5", "e", "love it, part two when?"),
        ];

        let outcome = service
            .ingest("alice", "vid123", VideoMetadata::default(), batch)
            .await
            .unwrap();

        assert_eq!(outcome.comment_count, 5);
        assert_eq!(outcome.stats.sentiment.positive, 3);
        assert_eq!(outcome.stats.sentiment.neutral, 1);
        assert_eq!(outcome.stats.sentiment.negative, 1);
        assert_eq!(outcome.stats.categories.questions, 2);
        assert_eq!(outcome.stats.categories.praise, 2);
        assert_eq!(outcome.stats.categories.complaints, 1);
        assert_eq!(outcome.stats.categories.suggestions, 0);
        assert_eq!(outcome.stats.categories.spam, 0);

        // Video record carries the snapshot and batch size
        let video = db.get_video("alice", "vid123").await.unwrap().unwrap();
        assert_eq!(video.comment_count, 5);
        assert_eq!(video.stats, outcome.stats);

        // All comments stored
        let (comments, total) = db
            .list_comments("alice", "vid123", &Default::default())
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(comments.len(), 5);

        // Usage recorded
        let user = db.get_user("alice").await.unwrap().unwrap();
        assert_eq!(user.usage.videos_analyzed, 1);
        assert_eq!(user.usage.comments_processed, 5);
    }

    #[tokio::test]
    async fn ingest_fails_for_unknown_user() {
        let (db, _temp_dir) = create_test_db().await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer.expect_analyze().times(0);
        let service = create_service(db, analyzer);

        let error = service
            .ingest("ghost", "vid123", VideoMetadata::default(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(error, AppError::NotFound));
    }

    #[tokio::test]
    async fn quota_blocks_before_any_processing() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;
        db.update_usage_stats(
            "alice",
            &UsageStats {
                videos_analyzed: 3,
                comments_processed: 10,
                last_reset_date: Utc::now(),
            },
        )
        .await
        .unwrap();

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer.expect_analyze().times(0);
        let service = create_service(db.clone(), analyzer);

        let error = service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::QuotaExceeded));
        // No video record was created
        assert!(db.get_video("alice", "vid123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn quota_resets_across_month_boundary() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;
        db.update_usage_stats(
            "alice",
            &UsageStats {
                videos_analyzed: 3,
                comments_processed: 10,
                last_reset_date: Utc::now() - Duration::days(40),
            },
        )
        .await
        .unwrap();

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(echo_with(vec![analysis(Sentiment::Neutral, vec![])], None));
        let service = create_service(db.clone(), analyzer);

        service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap();

        let user = db.get_user("alice").await.unwrap().unwrap();
        // Reset to zero, then incremented by this analysis
        assert_eq!(user.usage.videos_analyzed, 1);
    }

    #[tokio::test]
    async fn malformed_comment_rejected_before_nlp_call() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer.expect_analyze().times(0);
        let service = create_service(db.clone(), analyzer);

        let error = service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "fine"), raw("c2", "b", "   ")],
            )
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::Validation(_)));
        assert!(db.get_video("alice", "vid123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn length_mismatch_is_upstream_failure_and_writes_nothing() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer.expect_analyze().returning(|_| {
            Ok(AnalysisResponse {
                comments: vec![],
                content_ideas: None,
            })
        });
        let service = create_service(db.clone(), analyzer);

        let error = service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::Upstream(_)));

        let (_, total) = db
            .list_comments("alice", "vid123", &Default::default())
            .await
            .unwrap();
        assert_eq!(total, 0);

        // Usage untouched
        let user = db.get_user("alice").await.unwrap().unwrap();
        assert_eq!(user.usage.videos_analyzed, 0);
    }

    #[tokio::test]
    async fn reingestion_overwrites_stats_and_deduplicates_comments() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer
            .expect_analyze()
            .times(1)
            .returning(echo_with(
                vec![
                    analysis(Sentiment::Positive, vec![]),
                    analysis(Sentiment::Positive, vec![]),
                ],
                None,
            ));
        analyzer
            .expect_analyze()
            .returning(echo_with(vec![analysis(Sentiment::Negative, vec![])], None));
        let service = create_service(db.clone(), analyzer);

        service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "nice"), raw("c2", "b", "cool")],
            )
            .await
            .unwrap();

        // Second batch re-ingests c1 with new text
        service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "changed my mind")],
            )
            .await
            .unwrap();

        let video = db.get_video("alice", "vid123").await.unwrap().unwrap();
        // Snapshot reflects only the latest batch
        assert_eq!(video.comment_count, 1);
        assert_eq!(video.stats.sentiment.negative, 1);
        assert_eq!(video.stats.sentiment.positive, 0);

        // c1 was overwritten, not duplicated
        let (comments, total) = db
            .list_comments("alice", "vid123", &Default::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        let c1 = comments
            .iter()
            .find(|c| c.comment_id == "c1")
            .expect("c1 present");
        assert_eq!(c1.text, "changed my mind");
    }

    #[tokio::test]
    async fn content_ideas_replaced_only_when_supplied() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let ideas = vec![ContentIdea {
            idea: "Answer the most common question in a follow-up".to_string(),
            source: "questions".to_string(),
            relevance: 0.9,
        }];

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer.expect_analyze().times(1).returning(echo_with(
            vec![analysis(Sentiment::Neutral, vec![])],
            Some(ideas.clone()),
        ));
        analyzer
            .expect_analyze()
            .returning(echo_with(vec![analysis(Sentiment::Neutral, vec![])], None));
        let service = create_service(db.clone(), analyzer);

        service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap();

        let video = db.get_video("alice", "vid123").await.unwrap().unwrap();
        assert_eq!(video.content_ideas, ideas);

        // Second ingestion supplies no ideas; the prior ones survive
        service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata::default(),
                vec![raw("c1", "a", "hello again")],
            )
            .await
            .unwrap();

        let video = db.get_video("alice", "vid123").await.unwrap().unwrap();
        assert_eq!(video.content_ideas, ideas);
    }

    #[tokio::test]
    async fn missing_metadata_synthesizes_defaults() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(echo_with(vec![analysis(Sentiment::Neutral, vec![])], None));
        let service = create_service(db.clone(), analyzer);

        service
            .ingest(
                "alice",
                "dQw4w9WgXcQ",
                VideoMetadata {
                    title: Some("".to_string()),
                    ..Default::default()
                },
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap();

        let video = db.get_video("alice", "dQw4w9WgXcQ").await.unwrap().unwrap();
        assert_eq!(video.title, "Untitled Video");
        assert_eq!(video.channel_name, "Unknown Channel");
        assert_eq!(
            video.thumbnail_url,
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/mqdefault.jpg"
        );
        assert_eq!(video.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[tokio::test]
    async fn supplied_metadata_is_kept() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "alice").await;

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(echo_with(vec![analysis(Sentiment::Neutral, vec![])], None));
        let service = create_service(db.clone(), analyzer);

        service
            .ingest(
                "alice",
                "vid123",
                VideoMetadata {
                    title: Some("My Video".to_string()),
                    channel: Some("My Channel".to_string()),
                    thumbnail: Some("https://example.com/thumb.jpg".to_string()),
                    url: Some("https://youtu.be/vid123".to_string()),
                },
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap();

        let video = db.get_video("alice", "vid123").await.unwrap().unwrap();
        assert_eq!(video.title, "My Video");
        assert_eq!(video.channel_name, "My Channel");
        assert_eq!(video.thumbnail_url, "https://example.com/thumb.jpg");
        assert_eq!(video.url, "https://youtu.be/vid123");
    }

    #[tokio::test]
    async fn pro_user_ingests_past_free_limit() {
        let (db, _temp_dir) = create_test_db().await;
        seed_user(&db, "bob").await;
        db.update_subscription("bob", Subscription::Pro)
            .await
            .unwrap();
        db.update_usage_stats(
            "bob",
            &UsageStats {
                videos_analyzed: 12,
                comments_processed: 400,
                last_reset_date: Utc::now(),
            },
        )
        .await
        .unwrap();

        let mut analyzer = MockCommentAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(echo_with(vec![analysis(Sentiment::Neutral, vec![])], None));
        let service = create_service(db.clone(), analyzer);

        service
            .ingest(
                "bob",
                "vid999",
                VideoMetadata::default(),
                vec![raw("c1", "a", "hello")],
            )
            .await
            .unwrap();

        let user = db.get_user("bob").await.unwrap().unwrap();
        assert_eq!(user.usage.videos_analyzed, 13);
    }
}
