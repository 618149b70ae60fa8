//! Data models
//!
//! Rust structs representing database entities and the aggregated
//! stats snapshot. All models use ULID for row IDs and chrono for
//! timestamps. Wire names follow the dashboard's camelCase contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Closed vocabularies
// =============================================================================

/// Sentiment bucket assigned by the NLP boundary
///
/// Closed vocabulary: values outside the three buckets are rejected
/// when the NLP response is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

/// Category tag assigned by the NLP boundary
///
/// A comment may carry zero or more tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentTag {
    Question,
    Praise,
    Suggestion,
    Complaint,
    Spam,
}

impl CommentTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Praise => "praise",
            Self::Suggestion => "suggestion",
            Self::Complaint => "complaint",
            Self::Spam => "spam",
        }
    }
}

impl std::str::FromStr for CommentTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" => Ok(Self::Question),
            "praise" => Ok(Self::Praise),
            "suggestion" => Ok(Self::Suggestion),
            "complaint" => Ok(Self::Complaint),
            "spam" => Ok(Self::Spam),
            other => Err(format!("unknown comment tag: {other}")),
        }
    }
}

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    Free,
    Pro,
}

impl Subscription {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
        }
    }

    /// Parse a stored subscription value, defaulting unknowns to free.
    pub fn from_db(value: &str) -> Self {
        match value {
            "pro" => Self::Pro,
            _ => Self::Free,
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A creator account, keyed by the identity provider's subject id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// External subject id (opaque, from the identity provider)
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub subscription: Subscription,
    pub usage: UsageStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user monthly usage counters
///
/// `videos_analyzed` and `last_reset_date` roll over lazily on read;
/// `comments_processed` is cumulative and never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub videos_analyzed: i64,
    pub comments_processed: i64,
    pub last_reset_date: DateTime<Utc>,
}

/// A YouTube channel registered by a user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub user_id: String,
    pub channel_id: String,
    pub channel_name: String,
    pub thumbnail_url: Option<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Video
// =============================================================================

/// Per-(user, video) summary record
///
/// `stats` always reflects only the most recent ingestion batch;
/// it is overwritten wholesale, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    pub url: String,
    /// Size of the most recently ingested batch, not a running total
    pub comment_count: i64,
    pub stats: StatsSnapshot,
    pub content_ideas: Vec<ContentIdea>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projection of a video row for the dashboard list view
#[derive(Debug, Clone)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub comment_count: i64,
    pub sentiment: SentimentCounts,
    pub created_at: DateTime<Utc>,
}

/// A content-idea suggestion supplied by the NLP boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentIdea {
    pub idea: String,
    pub source: String,
    pub relevance: f64,
}

// =============================================================================
// Stats snapshot
// =============================================================================

/// Aggregated statistics for exactly one ingestion batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub sentiment: SentimentCounts,
    pub categories: CategoryCounts,
    /// Language code -> number of comments in that language
    pub languages: BTreeMap<String, u64>,
    /// Top keywords, descending by count, ties in first-encountered order
    pub keywords: Vec<KeywordCount>,
}

/// Sentiment counters; each comment lands in exactly one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentCounts {
    /// Counter for the given sentiment bucket.
    pub fn bucket_mut(&mut self, sentiment: Sentiment) -> &mut u64 {
        match sentiment {
            Sentiment::Positive => &mut self.positive,
            Sentiment::Neutral => &mut self.neutral,
            Sentiment::Negative => &mut self.negative,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.neutral + self.negative
    }
}

/// Category counters; a multi-tagged comment increments several buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub questions: u64,
    pub praise: u64,
    pub suggestions: u64,
    pub complaints: u64,
    pub spam: u64,
}

impl CategoryCounts {
    /// Counter for the given tag. The mapping is exhaustive so adding
    /// a tag variant without a counter fails to compile.
    pub fn bucket_mut(&mut self, tag: CommentTag) -> &mut u64 {
        match tag {
            CommentTag::Question => &mut self.questions,
            CommentTag::Praise => &mut self.praise,
            CommentTag::Suggestion => &mut self.suggestions,
            CommentTag::Complaint => &mut self.complaints,
            CommentTag::Spam => &mut self.spam,
        }
    }
}

/// One keyword with its accumulated occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: u64,
}

// =============================================================================
// Comment
// =============================================================================

/// A stored comment, unique per (video_id, comment_id)
///
/// Re-ingesting the same pair overwrites rather than duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(skip)]
    pub id: String,
    pub comment_id: String,
    pub video_id: String,
    pub user_id: String,
    pub author: String,
    pub text: String,
    /// Free-text timestamp from the source page ("2 weeks ago"), not parsed
    pub timestamp: Option<String>,
    pub like_count: i64,
    pub is_reply: bool,
    /// Reference to another comment's comment_id within the same video;
    /// no referential integrity is enforced
    pub parent_id: Option<String>,
    pub analysis: CommentAnalysis,
    pub created_at: DateTime<Utc>,
}

/// Analysis fields produced by the NLP boundary, stored verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAnalysis {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub tags: Vec<CommentTag>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_relevance")]
    pub relevance: f64,
}

impl Default for CommentAnalysis {
    fn default() -> Self {
        Self {
            language: default_language(),
            sentiment: Sentiment::default(),
            tags: Vec::new(),
            keywords: Vec::new(),
            relevance: default_relevance(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn default_relevance() -> f64 {
    0.5
}
