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
    pub scheduler: SchedulerConfig,
    pub scraper: ScraperConfig,
    pub snapshot: SnapshotConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Daily cycle scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Run the daily cycle in the background
    pub enabled: bool,
    /// UTC hour of the daily run (0-23)
    pub run_at_hour: u32,
    /// UTC minute of the daily run (0-59)
    pub run_at_minute: u32,
    /// Accounts re-scraped in parallel during the cycle
    pub max_concurrent_accounts: usize,
}

/// Scrape collaborator gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Base URL of the scraper gateway. Scraping is disabled when unset.
    pub endpoint: Option<String>,
    /// Bearer token sent to the gateway
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Pause between consecutive gateway calls, in milliseconds
    pub request_delay_ms: u64,
    /// Maximum videos requested per profile scrape
    pub profile_limit: u32,
}

/// Snapshot engine tuning
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Videos captured in parallel
    pub max_concurrent: usize,
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
    /// 4. Environment variables (REELTRACK__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "./data/reeltrack.db")?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.run_at_hour", 2)?
            .set_default("scheduler.run_at_minute", 0)?
            .set_default("scheduler.max_concurrent_accounts", 4)?
            .set_default("scraper.timeout_secs", 120)?
            .set_default("scraper.request_delay_ms", 2000)?
            .set_default("scraper.profile_limit", 50)?
            .set_default("snapshot.max_concurrent", 8)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (REELTRACK__*)
            .add_source(
                Environment::with_prefix("REELTRACK")
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

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.scheduler.run_at_hour > 23 {
            return Err(AppError::Config(
                "scheduler.run_at_hour must be between 0 and 23".to_string(),
            ));
        }
        if self.scheduler.run_at_minute > 59 {
            return Err(AppError::Config(
                "scheduler.run_at_minute must be between 0 and 59".to_string(),
            ));
        }
        if self.scheduler.max_concurrent_accounts == 0 {
            return Err(AppError::Config(
                "scheduler.max_concurrent_accounts must be greater than 0".to_string(),
            ));
        }
        if self.snapshot.max_concurrent == 0 {
            return Err(AppError::Config(
                "snapshot.max_concurrent must be greater than 0".to_string(),
            ));
        }
        if self.scraper.timeout_secs == 0 {
            return Err(AppError::Config(
                "scraper.timeout_secs must be greater than 0".to_string(),
            ));
        }

        match self.scraper.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => {
                let parsed = url::Url::parse(endpoint).map_err(|e| {
                    AppError::Config(format!("scraper.endpoint is not a valid URL: {}", e))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(AppError::Config(
                        "scraper.endpoint must use http or https".to_string(),
                    ));
                }
            }
            _ => tracing::warn!("scraper.endpoint is not set; URL and account scraping is disabled"),
        }

        Ok(())
    }
}
