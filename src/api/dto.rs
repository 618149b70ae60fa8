//! API request/response payloads
//!
//! Wire names follow the dashboard's and extension's camelCase
//! contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{
    Channel, Comment, ContentIdea, SentimentCounts, StatsSnapshot, Subscription, UsageStats, User,
    Video, VideoSummary,
};
use crate::nlp::RawComment;

// =============================================================================
// Auth
// =============================================================================

/// POST /api/auth/google request body
#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub token: String,
}

/// User payload wrapped by the auth endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub subscription: Subscription,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_stats: Option<UsageStats>,
}

impl UserPayload {
    pub fn from_user(user: &User, include_usage: bool) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            picture: user.picture.clone(),
            subscription: user.subscription,
            usage_stats: include_usage.then(|| user.usage.clone()),
        }
    }
}

/// Response envelope for the auth endpoints
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserPayload,
}

// =============================================================================
// Videos
// =============================================================================

/// One row of GET /api/videos
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummaryPayload {
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: String,
    pub comment_count: i64,
    pub stats: SummaryStats,
    pub created_at: DateTime<Utc>,
}

/// Sentiment-only stats projection for the list view
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub sentiment: SentimentCounts,
}

impl From<VideoSummary> for VideoSummaryPayload {
    fn from(summary: VideoSummary) -> Self {
        Self {
            video_id: summary.video_id,
            title: summary.title,
            thumbnail_url: summary.thumbnail_url,
            comment_count: summary.comment_count,
            stats: SummaryStats {
                sentiment: summary.sentiment,
            },
            created_at: summary.created_at,
        }
    }
}

/// Full video payload for GET /api/videos/{videoId}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPayload {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    pub url: String,
    pub comment_count: i64,
    pub stats: StatsSnapshot,
    pub content_ideas: Vec<ContentIdea>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoPayload {
    fn from(video: Video) -> Self {
        Self {
            video_id: video.video_id,
            title: video.title,
            channel_name: video.channel_name,
            thumbnail_url: video.thumbnail_url,
            url: video.url,
            comment_count: video.comment_count,
            stats: video.stats,
            content_ideas: video.content_ideas,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

// =============================================================================
// Comment listing
// =============================================================================

/// Query parameters for GET /api/videos/{videoId}/comments
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListParams {
    pub sentiment: Option<crate::data::Sentiment>,
    /// Comma-separated tag list
    pub tags: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Response for GET /api/videos/{videoId}/comments
#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

// =============================================================================
// Ingestion
// =============================================================================

/// POST /api/videos/{videoId}/comments request body
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub comments: Vec<RawComment>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/videos/{videoId}/comments response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub video_id: String,
    pub stats: StatsSnapshot,
    pub comment_count: usize,
}

// =============================================================================
// User profile / usage / channels
// =============================================================================

/// GET /api/user/profile response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub subscription: Subscription,
    pub channels: Vec<Channel>,
    pub created_at: DateTime<Utc>,
}

/// GET /api/user/usage response
///
/// `limit` and `remaining` are null for pro subscribers (unlimited).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub subscription: Subscription,
    pub videos_analyzed: i64,
    pub comments_processed: i64,
    pub total_videos: i64,
    pub total_comments: i64,
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset_date: DateTime<Utc>,
}

/// POST /api/user/subscription request body
///
/// The plan arrives as a raw string so unknown values produce the
/// documented validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: String,
}

/// POST /api/user/subscription response
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Subscription,
}

/// POST /api/user/channels request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRequest {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// POST /api/user/channels response
#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub channels: Vec<Channel>,
}

// =============================================================================
// Analysis proxy
// =============================================================================

/// POST /api/analyze request body
#[derive(Debug, Deserialize)]
pub struct AnalyzeProxyRequest {
    pub comments: Vec<RawComment>,
}
