//! Stateless analysis proxy endpoint
//!
//! Forwards a comment batch to the NLP boundary without persisting
//! anything. Used by clients that want analysis without ingestion.

use axum::{extract::State, response::Json};

use super::dto::AnalyzeProxyRequest;
use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::nlp::AnalysisResponse;

/// POST /api/analyze
pub async fn analyze_comments(
    State(state): State<AppState>,
    CurrentUser(_identity): CurrentUser,
    Json(request): Json<AnalyzeProxyRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let analysis = state.analyzer.analyze(&request.comments).await?;

    Ok(Json(analysis))
}
