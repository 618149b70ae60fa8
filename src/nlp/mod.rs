//! NLP analysis boundary
//!
//! The analysis algorithm itself lives in an external service; this
//! module defines the boundary trait plus the HTTP client that talks
//! to it. The trait is injectable so the ingestion pipeline can be
//! tested with deterministic fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::data::{CommentAnalysis, ContentIdea};
use crate::error::AppError;
use crate::metrics;

/// A raw scraped comment, before analysis
///
/// Field names follow the extension's wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    /// Opaque comment id from the source page
    pub id: String,
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// A comment augmented with its analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedComment {
    pub id: String,
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_reply: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub analysis: CommentAnalysis,
}

/// Full response from the analysis boundary
///
/// `comments` must be parallel to the request batch (same order, same
/// length); `content_ideas` is optional and its absence is meaningful
/// (prior ideas are kept).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub comments: Vec<AnalyzedComment>,
    #[serde(default)]
    pub content_ideas: Option<Vec<ContentIdea>>,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    comments: &'a [RawComment],
}

/// Boundary to the external comment analysis service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentAnalyzer: Send + Sync {
    /// Analyze an ordered batch of raw comments.
    ///
    /// Implementations must return the same comments, in the same
    /// order, each augmented with an `analysis` object.
    async fn analyze(&self, comments: &[RawComment]) -> Result<AnalysisResponse, AppError>;
}

/// HTTP client for the NLP analysis service
pub struct HttpCommentAnalyzer {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpCommentAnalyzer {
    pub fn new(client: reqwest::Client, endpoint: String, timeout: Duration) -> Self {
        Self {
            client,
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl CommentAnalyzer for HttpCommentAnalyzer {
    /// POST the batch to the analysis endpoint.
    ///
    /// Timeouts and transport failures surface as retryable upstream
    /// errors; the orchestrator does not retry on its own.
    async fn analyze(&self, comments: &[RawComment]) -> Result<AnalysisResponse, AppError> {
        let started = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&AnalyzeRequest { comments })
            .send()
            .await
            .map_err(|e| {
                metrics::observe_nlp_request("error", started.elapsed());
                AppError::Upstream(format!("NLP service unreachable: {e}"))
            })?;

        if !response.status().is_success() {
            metrics::observe_nlp_request("error", started.elapsed());
            return Err(AppError::Upstream(format!(
                "NLP service returned status {}",
                response.status()
            )));
        }

        let analysis = response.json::<AnalysisResponse>().await.map_err(|e| {
            metrics::observe_nlp_request("malformed", started.elapsed());
            AppError::Upstream(format!("NLP service returned malformed analysis: {e}"))
        })?;

        metrics::observe_nlp_request("success", started.elapsed());
        Ok(analysis)
    }
}
