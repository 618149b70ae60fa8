//! Authentication endpoints

use axum::{extract::State, response::Json};
use chrono::Utc;

use super::dto::{AuthResponse, GoogleAuthRequest, UserPayload};
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;

/// POST /api/auth/google
///
/// Verifies the supplied credential and creates the user on first
/// sign-in.
pub async fn google_login(
    State(state): State<AppState>,
    Json(request): Json<GoogleAuthRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let identity = state
        .identity
        .verify(&request.token)
        .await
        .map_err(|error| match error {
            upstream @ AppError::Upstream(_) => upstream,
            _ => AppError::Unauthorized,
        })?;

    let user = state
        .db
        .find_or_create_user(
            &identity.subject,
            &identity.email,
            identity.display_name(),
            identity.picture.as_deref(),
        )
        .await?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(AuthResponse {
        user: UserPayload::from_user(&user, false),
    }))
}

/// GET /api/auth/me
///
/// Returns the authenticated user with usage stats. The lazy monthly
/// reset applies here because the stats are displayed.
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<AuthResponse>, AppError> {
    let mut user = state
        .db
        .get_user(&identity.subject)
        .await?
        .ok_or(AppError::NotFound)?;

    state.usage_service().refresh(&mut user, Utc::now()).await?;

    Ok(Json(AuthResponse {
        user: UserPayload::from_user(&user, true),
    }))
}
