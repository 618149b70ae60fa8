//! Common test utilities for E2E tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use commentcompass::auth::{IdentityProvider, VerifiedIdentity};
use commentcompass::data::{CommentAnalysis, CommentTag, ContentIdea, Sentiment};
use commentcompass::error::AppError;
use commentcompass::nlp::{AnalysisResponse, AnalyzedComment, CommentAnalyzer, RawComment};
use commentcompass::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Bearer token the fake identity provider accepts for Alice
pub const ALICE_TOKEN: &str = "alice-token";
/// Alice's subject id
pub const ALICE_SUBJECT: &str = "google-sub-alice";
/// Bearer token the fake identity provider accepts for Bob
pub const BOB_TOKEN: &str = "bob-token";

/// Identity provider fake backed by a static token table
pub struct FakeIdentityProvider {
    identities: HashMap<String, VerifiedIdentity>,
}

impl FakeIdentityProvider {
    pub fn with_test_users() -> Self {
        let mut identities = HashMap::new();
        identities.insert(
            ALICE_TOKEN.to_string(),
            VerifiedIdentity {
                subject: ALICE_SUBJECT.to_string(),
                email: "alice@example.com".to_string(),
                name: Some("Alice Creator".to_string()),
                picture: Some("https://example.com/alice.png".to_string()),
            },
        );
        identities.insert(
            BOB_TOKEN.to_string(),
            VerifiedIdentity {
                subject: "google-sub-bob".to_string(),
                email: "bob@example.com".to_string(),
                name: None,
                picture: None,
            },
        );
        Self { identities }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity, AppError> {
        self.identities
            .get(credential)
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// Deterministic rule-based analyzer fake
///
/// Mirrors the keyword fallback the real service uses, so tests can
/// craft comment texts with known analysis results:
/// - "love"/"great"/"awesome"/"amazing" -> positive + praise
/// - "bad"/"terrible"/"hate"/"worst"    -> negative + complaint
/// - a question mark                     -> question tag
/// - "you should"                        -> suggestion tag
/// - "check out my"                      -> spam tag
/// - "hola"                              -> language "es"
/// - words of 6+ letters become keywords (kept verbatim)
pub struct FakeAnalyzer;

fn analyze_text(text: &str) -> CommentAnalysis {
    let lower = text.to_lowercase();

    let sentiment = if ["love", "great", "awesome", "amazing"]
        .iter()
        .any(|w| lower.contains(w))
    {
        Sentiment::Positive
    } else if ["bad", "terrible", "hate", "worst"]
        .iter()
        .any(|w| lower.contains(w))
    {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    };

    let mut tags = Vec::new();
    if text.contains('?') {
        tags.push(CommentTag::Question);
    }
    if sentiment == Sentiment::Positive {
        tags.push(CommentTag::Praise);
    }
    if lower.contains("you should") {
        tags.push(CommentTag::Suggestion);
    }
    if sentiment == Sentiment::Negative {
        tags.push(CommentTag::Complaint);
    }
    if lower.contains("check out my") {
        tags.push(CommentTag::Spam);
    }

    let keywords = text
        .split_whitespace()
        .filter(|word| word.len() >= 6 && word.chars().all(char::is_alphanumeric))
        .map(String::from)
        .collect();

    CommentAnalysis {
        language: if lower.contains("hola") { "es" } else { "en" }.to_string(),
        sentiment,
        tags,
        keywords,
        relevance: 0.5,
    }
}

#[async_trait]
impl CommentAnalyzer for FakeAnalyzer {
    async fn analyze(&self, comments: &[RawComment]) -> Result<AnalysisResponse, AppError> {
        let analyzed: Vec<AnalyzedComment> = comments
            .iter()
            .map(|comment| AnalyzedComment {
                id: comment.id.clone(),
                author: comment.author.clone(),
                text: comment.text.clone(),
                timestamp: comment.timestamp.clone(),
                like_count: comment.like_count,
                is_reply: comment.is_reply,
                parent_id: comment.parent_id.clone(),
                analysis: analyze_text(&comment.text),
            })
            .collect();

        let has_questions = analyzed
            .iter()
            .any(|c| c.analysis.tags.contains(&CommentTag::Question));
        let content_ideas = has_questions.then(|| {
            vec![ContentIdea {
                idea: "Answer common viewer questions in a follow-up video".to_string(),
                source: "questions".to_string(),
                relevance: 0.8,
            }]
        });

        Ok(AnalysisResponse {
            comments: analyzed,
            content_ideas,
        })
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            database: config::DatabaseConfig {
                path: db_path.clone(),
            },
            auth: config::AuthConfig {
                google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            },
            nlp: config::NlpConfig {
                url: "http://localhost:8000/analyze".to_string(),
                timeout_seconds: 5,
            },
            limits: config::LimitsConfig {
                free_monthly_videos: 3,
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state with fake boundaries
        let state = AppState::with_boundaries(
            config,
            Arc::new(FakeIdentityProvider::with_test_users()),
            Arc::new(FakeAnalyzer),
        )
        .await
        .unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = commentcompass::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Sign in a test user, creating the account on first call
    pub async fn sign_in(&self, token: &str) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/auth/google"))
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    /// POST a comment batch for a video as the given user
    pub async fn ingest(
        &self,
        token: &str,
        video_id: &str,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/videos/{video_id}/comments")))
            .header("Authorization", format!("Bearer {token}"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Authenticated GET
    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap()
    }
}

/// A simple raw comment JSON object for ingestion bodies
pub fn raw_comment(id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "author": format!("viewer-{id}"),
        "text": text,
        "timestamp": "1 day ago",
        "likeCount": 3,
        "isReply": false,
    })
}
