//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub nlp: NlpConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration (Google identity tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// OAuth client ID the verified token audience must match
    pub google_client_id: String,
}

/// NLP analysis service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NlpConfig {
    /// Analysis endpoint (e.g., "http://localhost:8000/analyze")
    pub url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Plan limit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Videos a free user may analyze per calendar month
    pub free_monthly_videos: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (COMMENTCOMPASS_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "data/commentcompass.db")?
            .set_default("nlp.url", "http://localhost:8000/analyze")?
            .set_default("nlp.timeout_seconds", 30)?
            .set_default("limits.free_monthly_videos", 3)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (COMMENTCOMPASS_*)
            .add_source(
                Environment::with_prefix("COMMENTCOMPASS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.auth.google_client_id.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "auth.google_client_id must not be empty".to_string(),
            ));
        }

        if url::Url::parse(&self.nlp.url).is_err() {
            return Err(crate::error::AppError::Config(format!(
                "nlp.url is not a valid URL: {}",
                self.nlp.url
            )));
        }

        if self.nlp.timeout_seconds == 0 {
            return Err(crate::error::AppError::Config(
                "nlp.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
