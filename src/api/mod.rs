//! API layer
//!
//! HTTP handlers for:
//! - Authentication endpoints
//! - Video/comment endpoints (ingestion + dashboard reads)
//! - User profile/usage endpoints
//! - Analysis proxy
//! - Metrics (Prometheus)

mod analyze;
mod auth;
mod dto;
pub mod metrics;
mod users;
mod videos;

pub use dto::*;

pub use metrics::metrics_router;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Create the `/api` router
///
/// `POST /auth/google` is the only public endpoint; everything else
/// verifies the bearer credential via the `CurrentUser` extractor in
/// its handler.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/auth/google", post(auth::google_login))
        .route("/auth/me", get(auth::me))
        // Videos and comments
        .route("/videos", get(videos::list_videos))
        .route("/videos/:video_id", get(videos::get_video))
        .route(
            "/videos/:video_id/comments",
            get(videos::list_comments).post(videos::ingest_comments),
        )
        // User
        .route("/user/profile", get(users::profile))
        .route("/user/usage", get(users::usage))
        .route("/user/subscription", post(users::update_subscription))
        .route("/user/channels", post(users::add_channel))
        // Analysis proxy
        .route("/analyze", post(analyze::analyze_comments))
}
