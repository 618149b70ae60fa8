//! User profile, usage, subscription, and channel endpoints

use axum::{extract::State, response::Json};
use chrono::{Datelike, TimeZone, Utc};

use super::dto::{
    ChannelRequest, ChannelsResponse, ProfileResponse, SubscriptionRequest, SubscriptionResponse,
    UsageResponse,
};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::Subscription;
use crate::error::AppError;

/// GET /api/user/profile
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .db
        .get_user(&identity.subject)
        .await?
        .ok_or(AppError::NotFound)?;
    let channels = state.db.get_channels(&user.id).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        picture: user.picture,
        subscription: user.subscription,
        channels,
        created_at: user.created_at,
    }))
}

/// GET /api/user/usage
///
/// Applies the lazy monthly reset before reporting.
pub async fn usage(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<UsageResponse>, AppError> {
    let mut user = state
        .db
        .get_user(&identity.subject)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let usage_service = state.usage_service();
    usage_service.refresh(&mut user, now).await?;

    let total_videos = state.db.count_videos(&user.id).await?;
    let total_comments = state.db.count_comments(&user.id).await?;

    Ok(Json(UsageResponse {
        subscription: user.subscription,
        videos_analyzed: user.usage.videos_analyzed,
        comments_processed: user.usage.comments_processed,
        total_videos,
        total_comments,
        limit: usage_service.monthly_limit(&user),
        remaining: usage_service.remaining(&user),
        reset_date: first_of_next_month(now),
    }))
}

/// POST /api/user/subscription
pub async fn update_subscription(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<SubscriptionRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let subscription = match request.subscription.as_str() {
        "free" => Subscription::Free,
        "pro" => Subscription::Pro,
        _ => {
            return Err(AppError::Validation(
                "Invalid subscription type".to_string(),
            ));
        }
    };

    let updated = state
        .db
        .update_subscription(&identity.subject, subscription)
        .await?;
    if !updated {
        return Err(AppError::NotFound);
    }

    tracing::info!(user_id = %identity.subject, plan = subscription.as_str(), "Subscription updated");

    Ok(Json(SubscriptionResponse { subscription }))
}

/// POST /api/user/channels
///
/// Appends a channel; re-adding an existing channelId is a no-op.
pub async fn add_channel(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(request): Json<ChannelRequest>,
) -> Result<Json<ChannelsResponse>, AppError> {
    if request.channel_id.trim().is_empty() || request.channel_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Channel ID and name are required".to_string(),
        ));
    }

    // The user must exist before channels can be attached
    state
        .db
        .get_user(&identity.subject)
        .await?
        .ok_or(AppError::NotFound)?;

    state
        .db
        .add_channel(
            &identity.subject,
            &request.channel_id,
            &request.channel_name,
            request.thumbnail_url.as_deref(),
        )
        .await?;

    let channels = state.db.get_channels(&identity.subject).await?;

    Ok(Json(ChannelsResponse { channels }))
}

/// First day of the month after `now`, when the free plan counters
/// next roll over.
fn first_of_next_month(now: chrono::DateTime<Utc>) -> chrono::DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_month_within_year() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 13, 30, 0).unwrap();
        let reset = first_of_next_month(now);
        assert_eq!(reset, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn next_month_rolls_over_year() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 0).unwrap();
        let reset = first_of_next_month(now);
        assert_eq!(reset, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}
