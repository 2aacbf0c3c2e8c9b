//! HTTP scraper gateway client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{ScrapeTarget, ScraperSource, TargetKind};
use crate::config::ScraperConfig;
use crate::data::Platform;
use crate::error::AppError;
use crate::metrics::SCRAPE_REQUESTS_TOTAL;

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    platform: Platform,
    #[serde(flatten)]
    kind: &'a TargetKind,
    limit: u32,
}

/// Items stay raw so a malformed record cannot sink the whole response.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScrapeResponse {
    Wrapped { videos: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

/// Posts scrape requests to an external gateway that drives the platform scrapers.
pub struct HttpScraperSource {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    request_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpScraperSource {
    pub fn new(config: &ScraperConfig) -> Result<Self, AppError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Config("scraper.endpoint is required".to_string()))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("ReelTrack/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            request_delay: Duration::from_millis(config.request_delay_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Space consecutive gateway calls by at least `request_delay`.
    async fn pace(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.request_delay;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn send(
        &self,
        target: &ScrapeTarget,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let body = ScrapeRequest {
            url: &target.url,
            platform: target.platform,
            kind: &target.kind,
            limit,
        };

        let mut request = self
            .client
            .post(format!("{}/scrape", self.endpoint))
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("scraper request for {} failed: {}", target.url, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable(format!(
                "scraper returned {} for {}: {}",
                status.as_u16(),
                target.url,
                message.trim()
            )));
        }

        let parsed: ScrapeResponse = response.json().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!(
                "scraper response for {} was not understood: {}",
                target.url, e
            ))
        })?;

        Ok(match parsed {
            ScrapeResponse::Wrapped { videos } => videos,
            ScrapeResponse::Bare(videos) => videos,
        })
    }
}

#[async_trait]
impl ScraperSource for HttpScraperSource {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        self.pace().await;

        tracing::info!(url = %target.url, platform = %target.platform, limit, "Scraping target");
        let result = self.send(target, limit).await;

        let status = if result.is_ok() { "success" } else { "error" };
        SCRAPE_REQUESTS_TOTAL
            .with_label_values(&[target.platform.as_str(), status])
            .inc();

        match &result {
            Ok(records) => tracing::info!(url = %target.url, count = records.len(), "Scrape completed"),
            Err(error) => tracing::warn!(url = %target.url, %error, "Scrape failed"),
        }
        result
    }
}

/// Used when no gateway is configured; every fetch fails for its own target.
pub struct DisabledScraperSource;

#[async_trait]
impl ScraperSource for DisabledScraperSource {
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        _limit: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        Err(AppError::UpstreamUnavailable(format!(
            "no scraper gateway configured; cannot scrape {}",
            target.url
        )))
    }
}
