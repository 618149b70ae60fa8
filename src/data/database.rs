//! SQLite database operations
//!
//! All database access goes through this module.
//! Compound uniqueness constraints — (user_id, video_id) for videos and
//! (video_id, comment_id) for comments — are enforced by the schema, and
//! writes against them use upsert statements so re-ingestion is idempotent.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqlitePool};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::Internal(e.into()))
}

/// Decode a stored JSON column, falling back to the default on rows
/// written by older schema revisions.
fn from_json_or_default<T: DeserializeOwned + Default>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}

fn sentiment_from_db(value: &str) -> Sentiment {
    match value {
        "positive" => Sentiment::Positive,
        "negative" => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, AppError> {
    let subscription: String = row.try_get("subscription")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        picture: row.try_get("picture")?,
        subscription: Subscription::from_db(&subscription),
        usage: UsageStats {
            videos_analyzed: row.try_get("videos_analyzed")?,
            comments_processed: row.try_get("comments_processed")?,
            last_reset_date: row.try_get("last_reset_date")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn video_from_row(row: &SqliteRow) -> Result<Video, AppError> {
    let stats: String = row.try_get("stats")?;
    let content_ideas: String = row.try_get("content_ideas")?;
    Ok(Video {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        video_id: row.try_get("video_id")?,
        title: row.try_get("title")?,
        channel_name: row.try_get("channel_name")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        url: row.try_get("url")?,
        comment_count: row.try_get("comment_count")?,
        stats: from_json_or_default(&stats),
        content_ideas: from_json_or_default(&content_ideas),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, AppError> {
    let sentiment: String = row.try_get("sentiment")?;
    let tags: String = row.try_get("tags")?;
    let keywords: String = row.try_get("keywords")?;
    Ok(Comment {
        id: row.try_get("id")?,
        comment_id: row.try_get("comment_id")?,
        video_id: row.try_get("video_id")?,
        user_id: row.try_get("user_id")?,
        author: row.try_get("author")?,
        text: row.try_get("text")?,
        timestamp: row.try_get("timestamp")?,
        like_count: row.try_get("like_count")?,
        is_reply: row.try_get("is_reply")?,
        parent_id: row.try_get("parent_id")?,
        analysis: CommentAnalysis {
            language: row.try_get("language")?,
            sentiment: sentiment_from_db(&sentiment),
            tags: from_json_or_default(&tags),
            keywords: from_json_or_default(&keywords),
            relevance: row.try_get("relevance")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

/// Filter and pagination parameters for listing stored comments.
#[derive(Debug, Clone)]
pub struct CommentQuery {
    pub sentiment: Option<Sentiment>,
    pub tags: Vec<CommentTag>,
    pub search: Option<String>,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub sort: CommentSort,
    pub descending: bool,
}

impl Default for CommentQuery {
    fn default() -> Self {
        Self {
            sentiment: None,
            tags: Vec::new(),
            search: None,
            page: 1,
            limit: 50,
            sort: CommentSort::LikeCount,
            descending: true,
        }
    }
}

/// Sortable comment columns (whitelist, not free-form input)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    LikeCount,
    CreatedAt,
}

impl CommentSort {
    fn column(&self) -> &'static str {
        match self {
            Self::LikeCount => "like_count",
            Self::CreatedAt => "created_at",
        }
    }
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Create connection string
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());

        // Create connection pool
        let pool = SqlitePool::connect(&connection_string).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get a user by external subject id
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find a user by subject id, creating it with defaults on first sight
    ///
    /// The insert is a no-op when the user already exists, so concurrent
    /// first-time sign-ins cannot create duplicates.
    pub async fn find_or_create_user(
        &self,
        id: &str,
        email: &str,
        name: &str,
        picture: Option<&str>,
    ) -> Result<User, AppError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO users (
                id, email, name, picture, subscription,
                videos_analyzed, comments_processed, last_reset_date,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, 'free', 0, 0, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(picture)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_user(id).await?.ok_or(AppError::NotFound)
    }

    /// Update a user's subscription plan
    ///
    /// # Returns
    /// `false` if no such user exists.
    pub async fn update_subscription(
        &self,
        user_id: &str,
        subscription: Subscription,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET subscription = ?, updated_at = ? WHERE id = ?")
            .bind(subscription.as_str())
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite a user's usage counters (used by the lazy monthly reset)
    pub async fn update_usage_stats(
        &self,
        user_id: &str,
        usage: &UsageStats,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET videos_analyzed = ?, comments_processed = ?, last_reset_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(usage.videos_analyzed)
        .bind(usage.comments_processed)
        .bind(usage.last_reset_date)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record one completed analysis: videos_analyzed += 1,
    /// comments_processed += `comment_count`.
    ///
    /// The increments run inside a single statement so concurrent
    /// analyses for the same user cannot lose updates.
    pub async fn increment_usage(&self, user_id: &str, comment_count: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET videos_analyzed = videos_analyzed + 1,
                comments_processed = comments_processed + ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(comment_count)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Get all channels registered by a user, oldest first
    pub async fn get_channels(&self, user_id: &str) -> Result<Vec<Channel>, AppError> {
        let channels = sqlx::query_as::<_, Channel>(
            "SELECT * FROM channels WHERE user_id = ? ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    /// Register a channel for a user
    ///
    /// Deduplicated by (user_id, channel_id): re-adding an existing
    /// channel is a no-op.
    pub async fn add_channel(
        &self,
        user_id: &str,
        channel_id: &str,
        channel_name: &str,
        thumbnail_url: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO channels (
                id, user_id, channel_id, channel_name, thumbnail_url, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(EntityId::new().0)
        .bind(user_id)
        .bind(channel_id)
        .bind(channel_name)
        .bind(thumbnail_url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Videos
    // =========================================================================

    /// Get a video by its (user, video) compound key
    pub async fn get_video(
        &self,
        user_id: &str,
        video_id: &str,
    ) -> Result<Option<Video>, AppError> {
        let row = sqlx::query("SELECT * FROM videos WHERE user_id = ? AND video_id = ?")
            .bind(user_id)
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(video_from_row).transpose()
    }

    /// Insert a new video record
    pub async fn insert_video(&self, video: &Video) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO videos (
                id, user_id, video_id, title, channel_name, thumbnail_url, url,
                comment_count, stats, content_ideas, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&video.id)
        .bind(&video.user_id)
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.channel_name)
        .bind(&video.thumbnail_url)
        .bind(&video.url)
        .bind(video.comment_count)
        .bind(to_json(&video.stats)?)
        .bind(to_json(&video.content_ideas)?)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List a user's videos as dashboard summaries, newest first
    pub async fn list_video_summaries(
        &self,
        user_id: &str,
    ) -> Result<Vec<VideoSummary>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT video_id, title, thumbnail_url, comment_count, stats, created_at
            FROM videos
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let stats: String = row.try_get("stats")?;
                let snapshot: StatsSnapshot = from_json_or_default(&stats);
                Ok(VideoSummary {
                    video_id: row.try_get("video_id")?,
                    title: row.try_get("title")?,
                    thumbnail_url: row.try_get("thumbnail_url")?,
                    comment_count: row.try_get("comment_count")?,
                    sentiment: snapshot.sentiment,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Overwrite a video's stats snapshot and batch size
    ///
    /// `content_ideas` is only replaced when the caller supplies one;
    /// `None` leaves the previously stored ideas untouched.
    pub async fn update_video_snapshot(
        &self,
        user_id: &str,
        video_id: &str,
        stats: &StatsSnapshot,
        comment_count: i64,
        content_ideas: Option<&[ContentIdea]>,
    ) -> Result<(), AppError> {
        let ideas_json = content_ideas.map(|ideas| to_json(&ideas)).transpose()?;

        sqlx::query(
            r#"
            UPDATE videos
            SET stats = ?,
                comment_count = ?,
                content_ideas = COALESCE(?, content_ideas),
                updated_at = ?
            WHERE user_id = ? AND video_id = ?
            "#,
        )
        .bind(to_json(stats)?)
        .bind(comment_count)
        .bind(ideas_json)
        .bind(Utc::now())
        .bind(user_id)
        .bind(video_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Count all videos belonging to a user
    pub async fn count_videos(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert or overwrite a comment, keyed by (video_id, comment_id)
    ///
    /// Applying the same comment twice yields the same stored state as
    /// applying it once; the second write's fields win. Malformed comments
    /// (empty id, author, or text) are rejected before any write.
    pub async fn upsert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        if comment.comment_id.trim().is_empty()
            || comment.author.trim().is_empty()
            || comment.text.trim().is_empty()
        {
            return Err(AppError::Validation(
                "comment requires a non-empty id, author, and text".to_string(),
            ));
        }

        sqlx::query(
            r#"
            INSERT INTO comments (
                id, comment_id, video_id, user_id, author, text, timestamp,
                like_count, is_reply, parent_id, language, sentiment, tags,
                keywords, relevance, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (video_id, comment_id) DO UPDATE SET
                user_id = excluded.user_id,
                author = excluded.author,
                text = excluded.text,
                timestamp = excluded.timestamp,
                like_count = excluded.like_count,
                is_reply = excluded.is_reply,
                parent_id = excluded.parent_id,
                language = excluded.language,
                sentiment = excluded.sentiment,
                tags = excluded.tags,
                keywords = excluded.keywords,
                relevance = excluded.relevance
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.comment_id)
        .bind(&comment.video_id)
        .bind(&comment.user_id)
        .bind(&comment.author)
        .bind(&comment.text)
        .bind(&comment.timestamp)
        .bind(comment.like_count)
        .bind(comment.is_reply)
        .bind(&comment.parent_id)
        .bind(&comment.analysis.language)
        .bind(comment.analysis.sentiment.as_str())
        .bind(to_json(&comment.analysis.tags)?)
        .bind(to_json(&comment.analysis.keywords)?)
        .bind(comment.analysis.relevance)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List a video's comments with filters and pagination
    ///
    /// # Returns
    /// The page of comments plus the total match count (for pagination).
    pub async fn list_comments(
        &self,
        user_id: &str,
        video_id: &str,
        query: &CommentQuery,
    ) -> Result<(Vec<Comment>, i64), AppError> {
        let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments");
        push_comment_filters(&mut count_builder, user_id, video_id, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM comments");
        push_comment_filters(&mut builder, user_id, video_id, query);

        builder.push(" ORDER BY ");
        builder.push(query.sort.column());
        builder.push(if query.descending { " DESC" } else { " ASC" });

        let limit = query.limit.max(1) as i64;
        let offset = (query.page.max(1) as i64 - 1) * limit;
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let comments = rows
            .iter()
            .map(comment_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((comments, total))
    }

    /// Count all comments belonging to a user
    pub async fn count_comments(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Append the shared WHERE clause for comment listing and counting.
fn push_comment_filters<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    user_id: &'a str,
    video_id: &'a str,
    query: &'a CommentQuery,
) {
    builder.push(" WHERE user_id = ");
    builder.push_bind(user_id);
    builder.push(" AND video_id = ");
    builder.push_bind(video_id);

    if let Some(sentiment) = query.sentiment {
        builder.push(" AND sentiment = ");
        builder.push_bind(sentiment.as_str());
    }

    if !query.tags.is_empty() {
        builder.push(" AND EXISTS (SELECT 1 FROM json_each(comments.tags) WHERE json_each.value IN (");
        let mut separated = builder.separated(", ");
        for tag in &query.tags {
            separated.push_bind(tag.as_str());
        }
        builder.push("))");
    }

    if let Some(search) = &query.search {
        builder.push(" AND text LIKE ");
        builder.push_bind(format!("%{}%", search));
    }
}
