//! Common test utilities for E2E tests

#![allow(dead_code)]

use async_trait::async_trait;
use reeltrack::data::VideoRecord;
use reeltrack::error::AppError;
use reeltrack::scraper::{ScrapeTarget, ScraperSource, TargetKind};
use reeltrack::{AppState, config};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Scrape collaborator serving a fixed set of records
///
/// Profile targets return the records of that author; video targets return
/// records whose id appears in the URL.
#[derive(Default)]
pub struct StaticScraperSource {
    records: Mutex<Vec<VideoRecord>>,
}

impl StaticScraperSource {
    pub fn set_records(&self, records: Vec<VideoRecord>) {
        *self.records.lock().unwrap() = records;
    }
}

#[async_trait]
impl ScraperSource for StaticScraperSource {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let records = self.records.lock().unwrap().clone();
        let matching = records.into_iter().filter(|record| match &target.kind {
            TargetKind::Profile { username } => {
                record.author_username.as_deref() == Some(username.as_str())
            }
            TargetKind::Video => target.url.contains(&record.id),
        });
        Ok(matching
            .take(limit as usize)
            .map(|record| serde_json::to_value(record).unwrap())
            .collect())
    }
}

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub scraper: Arc<StaticScraperSource>,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        reeltrack::metrics::init_metrics();

        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        // Create test configuration
        let config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
                cors_origins: Vec::new(),
            },
            database: config::DatabaseConfig { path: db_path },
            scheduler: config::SchedulerConfig {
                enabled: false,
                run_at_hour: 2,
                run_at_minute: 0,
                max_concurrent_accounts: 2,
            },
            scraper: config::ScraperConfig {
                endpoint: None,
                api_key: None,
                timeout_secs: 10,
                request_delay_ms: 0,
                profile_limit: 50,
            },
            snapshot: config::SnapshotConfig { max_concurrent: 4 },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };

        // Initialize app state around the static collaborator
        let scraper = Arc::new(StaticScraperSource::default());
        let state = AppState::with_scraper(config, scraper.clone())
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

        let app = reeltrack::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            scraper,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Push records through the ingestion endpoint and return the report
    pub async fn ingest(&self, records: serde_json::Value) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/ingest/records"))
            .json(&records)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 200, "GET {} failed", path);
        response.json().await.unwrap()
    }
}

/// Minimal tiktok record as JSON
pub fn video_json(id: &str, author: &str, views: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "platform": "tiktok",
        "url": format!("https://www.tiktok.com/@{}/video/{}", author, id),
        "author_username": author,
        "views": views,
    })
}
