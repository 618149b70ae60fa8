//! Video and comment endpoints
//!
//! Includes the ingestion entry point (POST comments) plus the
//! dashboard's read paths.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use super::dto::{
    CommentListParams, CommentListResponse, IngestRequest, IngestResponse, Pagination,
    VideoPayload, VideoSummaryPayload,
};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::{CommentQuery, CommentSort, CommentTag};
use crate::error::AppError;
use crate::service::VideoMetadata;

/// GET /api/videos
///
/// The caller's videos as dashboard summaries, newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Vec<VideoSummaryPayload>>, AppError> {
    let summaries = state.db.list_video_summaries(&identity.subject).await?;

    Ok(Json(
        summaries.into_iter().map(VideoSummaryPayload::from).collect(),
    ))
}

/// GET /api/videos/{videoId}
pub async fn get_video(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
) -> Result<Json<VideoPayload>, AppError> {
    let video = state
        .db
        .get_video(&identity.subject, &video_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(VideoPayload::from(video)))
}

/// GET /api/videos/{videoId}/comments
///
/// Filtered, paginated comment listing.
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<CommentListResponse>, AppError> {
    let query = build_comment_query(&params)?;

    let (comments, total) = state
        .db
        .list_comments(&identity.subject, &video_id, &query)
        .await?;

    let pages = (total + i64::from(query.limit) - 1) / i64::from(query.limit);

    Ok(Json(CommentListResponse {
        comments,
        pagination: Pagination {
            total,
            page: query.page,
            limit: query.limit,
            pages,
        },
    }))
}

/// POST /api/videos/{videoId}/comments
///
/// The ingestion entry point: analyzes the batch, persists comments,
/// overwrites the video's stats snapshot, and records usage.
pub async fn ingest_comments(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(video_id): Path<String>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, AppError> {
    let metadata = VideoMetadata {
        title: request.title,
        channel: request.channel,
        thumbnail: request.thumbnail,
        url: request.url,
    };

    let outcome = state
        .ingestion_service()
        .ingest(&identity.subject, &video_id, metadata, request.comments)
        .await?;

    Ok(Json(IngestResponse {
        success: true,
        video_id,
        stats: outcome.stats,
        comment_count: outcome.comment_count,
    }))
}

/// Translate wire query parameters into a data-layer comment query,
/// rejecting values outside the closed vocabularies.
fn build_comment_query(params: &CommentListParams) -> Result<CommentQuery, AppError> {
    let tags = match &params.tags {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(|tag| {
                tag.parse::<CommentTag>()
                    .map_err(AppError::Validation)
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let sort = match params.sort_by.as_deref() {
        None | Some("likeCount") => CommentSort::LikeCount,
        Some("createdAt") => CommentSort::CreatedAt,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "unknown sortBy value: {other}"
            )));
        }
    };

    Ok(CommentQuery {
        sentiment: params.sentiment,
        tags,
        search: params.search.clone(),
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(50).clamp(1, 200),
        sort,
        descending: params.sort_order.as_deref() != Some("asc"),
    })
}
