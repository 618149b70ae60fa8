//! Usage tracking
//!
//! Tracks how many videos a user has analyzed in the current calendar
//! month. The monthly rollover is evaluated lazily at read and
//! limit-check time; there is no background scheduler.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::data::{Database, Subscription, UsageStats, User};
use crate::error::AppError;

/// Reset the monthly counters when `now` falls in a different calendar
/// month (or year) than the stored reset date.
///
/// Only `videos_analyzed` rolls over; `comments_processed` is a
/// lifetime total.
///
/// # Returns
/// The reset stats, or `None` when no rollover is due.
pub fn reset_if_new_month(usage: &UsageStats, now: DateTime<Utc>) -> Option<UsageStats> {
    let last = usage.last_reset_date;
    if last.month() == now.month() && last.year() == now.year() {
        return None;
    }

    Some(UsageStats {
        videos_analyzed: 0,
        comments_processed: usage.comments_processed,
        last_reset_date: now,
    })
}

/// Usage tracking service
pub struct UsageService {
    db: Arc<Database>,
    free_monthly_videos: u32,
}

impl UsageService {
    /// Create new usage service
    pub fn new(db: Arc<Database>, free_monthly_videos: u32) -> Self {
        Self {
            db,
            free_monthly_videos,
        }
    }

    /// Apply the lazy monthly reset to a loaded user, persisting it
    /// when it fires.
    pub async fn refresh(&self, user: &mut User, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(reset) = reset_if_new_month(&user.usage, now) {
            self.db.update_usage_stats(&user.id, &reset).await?;
            tracing::debug!(user_id = %user.id, "Monthly usage counters reset");
            user.usage = reset;
        }

        Ok(())
    }

    /// Whether the user is blocked by the free plan limit.
    ///
    /// Applies the lazy monthly reset first. Pro subscribers are never
    /// limited, but their counters keep incrementing for display.
    pub async fn has_reached_limit(
        &self,
        user: &mut User,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.refresh(user, now).await?;

        Ok(user.subscription == Subscription::Free
            && user.usage.videos_analyzed >= i64::from(self.free_monthly_videos))
    }

    /// Record one completed analysis.
    ///
    /// Increments unconditionally; limit enforcement is the caller's
    /// responsibility and happens before this call.
    pub async fn record_analysis(
        &self,
        user_id: &str,
        comment_count: usize,
    ) -> Result<(), AppError> {
        self.db
            .increment_usage(user_id, comment_count as i64)
            .await
    }

    /// Monthly video limit for the user's plan; `None` means unlimited.
    pub fn monthly_limit(&self, user: &User) -> Option<u32> {
        match user.subscription {
            Subscription::Free => Some(self.free_monthly_videos),
            Subscription::Pro => None,
        }
    }

    /// Analyses left this month; `None` means unlimited.
    pub fn remaining(&self, user: &User) -> Option<u32> {
        self.monthly_limit(user).map(|limit| {
            let used = u32::try_from(user.usage.videos_analyzed.max(0)).unwrap_or(u32::MAX);
            limit.saturating_sub(used)
        })
    }
}
