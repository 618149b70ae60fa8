//! CommentCompass - comment analytics backend for YouTube creators
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Auth endpoints (Google credential verification)          │
//! │  - Video/comment endpoints (ingestion + dashboard reads)    │
//! │  - User profile/usage endpoints                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Ingestion pipeline (quota → NLP → aggregate → persist)   │
//! │  - Stats aggregation                                        │
//! │  - Usage tracking (lazy monthly reset)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Data Layer / Boundaries                      │
//! │  - SQLite (sqlx)                                            │
//! │  - Identity provider (Google tokeninfo)                     │
//! │  - NLP analysis service (HTTP)                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database layer and models
//! - `nlp`: External analysis boundary
//! - `auth`: Identity verification boundary
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod nlp;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

/// Maximum accepted request body size; scraped comment batches for
/// popular videos get large.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains shared
/// resources: the database pool plus the two external boundaries.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Identity provider boundary (verifies bearer credentials)
    pub identity: Arc<dyn auth::IdentityProvider>,

    /// NLP analysis boundary
    pub analyzer: Arc<dyn nlp::CommentAnalyzer>,
}

impl AppState {
    /// Initialize application state with production boundaries
    ///
    /// # Steps
    /// 1. Connect to SQLite database (runs migrations)
    /// 2. Build the shared HTTP client
    /// 3. Wire up the Google identity and NLP boundaries
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let http_client = reqwest::Client::builder()
            .user_agent("CommentCompass/0.1.0")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| error::AppError::Internal(e.into()))?;

        let identity = Arc::new(auth::GoogleIdentityProvider::new(
            http_client.clone(),
            config.auth.google_client_id.clone(),
        ));

        let analyzer = Arc::new(nlp::HttpCommentAnalyzer::new(
            http_client,
            config.nlp.url.clone(),
            Duration::from_secs(config.nlp.timeout_seconds),
        ));

        Self::with_boundaries(config, identity, analyzer).await
    }

    /// Initialize application state with injected boundaries
    ///
    /// Used by tests to swap the identity provider and analyzer for
    /// deterministic fakes.
    pub async fn with_boundaries(
        config: config::AppConfig,
        identity: Arc<dyn auth::IdentityProvider>,
        analyzer: Arc<dyn nlp::CommentAnalyzer>,
    ) -> Result<Self, error::AppError> {
        let db = data::Database::connect(&config.database.path).await?;
        tracing::info!("Database connected");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            identity,
            analyzer,
        })
    }

    /// Usage tracking service over this state's database
    pub fn usage_service(&self) -> service::UsageService {
        service::UsageService::new(self.db.clone(), self.config.limits.free_monthly_videos)
    }

    /// Ingestion pipeline over this state's database and boundaries
    pub fn ingestion_service(&self) -> service::IngestionService {
        service::IngestionService::new(self.db.clone(), self.analyzer.clone(), self.usage_service())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use axum::extract::DefaultBodyLimit;
    use tower::ServiceBuilder;
    use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        .merge(api::metrics_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                // The extension posts from content scripts on youtube.com
                // and the dashboard runs on its own origin
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
