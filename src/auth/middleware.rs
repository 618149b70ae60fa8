//! Authentication extractors
//!
//! Every protected route verifies the request's bearer credential
//! against the identity provider boundary; there is no session store.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use super::identity::VerifiedIdentity;
use crate::AppState;
use crate::error::AppError;

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(ToOwned::to_owned)
}

/// Extractor for the current authenticated identity
///
/// Use in handlers to require authentication.
///
/// # Usage
/// ```ignore
/// async fn handler(
///     CurrentUser(identity): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}", identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub VerifiedIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    /// Extract and verify the bearer credential from the request.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<VerifiedIdentity>().cloned() {
            return Ok(CurrentUser(identity));
        }

        let state = AppState::from_ref(state);
        let token = extract_bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let identity = state
            .identity
            .verify(&token)
            .await
            .map_err(|error| match error {
                upstream @ AppError::Upstream(_) => upstream,
                _ => AppError::Unauthorized,
            })?;
        parts.extensions.insert(identity.clone());

        Ok(CurrentUser(identity))
    }
}
