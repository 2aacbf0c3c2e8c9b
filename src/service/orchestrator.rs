//! Daily cycle orchestration
//!
//! Re-ingests every active account through the scrape collaborator, then
//! captures the day's snapshots. Also drives single-target ingestion for
//! ad-hoc jobs.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::data::{Account, Platform};
use crate::error::AppError;
use crate::metrics::{DAILY_CYCLE_DURATION_SECONDS, DAILY_CYCLES_TOTAL};
use crate::scraper::{ScrapeTarget, ScraperSource};
use crate::service::{CollectionService, IngestReport, IngestService, SnapshotReport, SnapshotService};

/// What started a daily cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleTrigger {
    Scheduled,
    Manual,
}

impl CycleTrigger {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Manual => "manual",
        }
    }
}

/// An account whose re-scrape failed
#[derive(Debug, Clone, Serialize)]
pub struct AccountFailure {
    pub username: String,
    pub platform: Platform,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct CycleReport {
    pub trigger: CycleTrigger,
    pub accounts_total: usize,
    pub accounts_scraped: usize,
    pub accounts_failed: Vec<AccountFailure>,
    pub videos_upserted: usize,
    pub snapshots: SnapshotReport,
}

/// Result of ingesting one scrape target
#[derive(Debug, Serialize)]
pub struct TargetOutcome {
    pub target: ScrapeTarget,
    pub report: IngestReport,
}

/// Wires the scrape collaborator, ingestion and snapshot engines together.
#[derive(Clone)]
pub struct Orchestrator {
    ingest: Arc<IngestService>,
    snapshots: SnapshotService,
    collections: Arc<CollectionService>,
    scraper: Arc<dyn ScraperSource>,
    db: Arc<crate::data::Database>,
    profile_limit: u32,
    max_concurrent_accounts: usize,
}

impl Orchestrator {
    pub fn new(
        db: Arc<crate::data::Database>,
        ingest: Arc<IngestService>,
        snapshots: SnapshotService,
        collections: Arc<CollectionService>,
        scraper: Arc<dyn ScraperSource>,
        profile_limit: u32,
        max_concurrent_accounts: usize,
    ) -> Self {
        Self {
            ingest,
            snapshots,
            collections,
            scraper,
            db,
            profile_limit,
            max_concurrent_accounts: max_concurrent_accounts.max(1),
        }
    }

    /// Fetch raw records, defaulting a missing platform to the target's.
    async fn fetch(
        &self,
        target: &ScrapeTarget,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let mut items = self.scraper.fetch(target, limit).await?;
        for object in items.iter_mut().filter_map(serde_json::Value::as_object_mut) {
            if object.get("platform").is_none_or(serde_json::Value::is_null) {
                object.insert(
                    "platform".to_string(),
                    serde_json::Value::String(target.platform.as_str().to_string()),
                );
            }
        }
        Ok(items)
    }

    /// Fetch one target, upsert its videos, file them in the Default
    /// collection and capture today's snapshot for each.
    pub async fn ingest_target(&self, target: &ScrapeTarget) -> Result<TargetOutcome, AppError> {
        let limit = if target.is_profile() { self.profile_limit } else { 1 };
        let items = self.fetch(target, limit).await?;
        tracing::info!(url = %target.url, platform = %target.platform, records = items.len(), "Target fetched");

        let report = self.ingest.apply_values(items).await;

        let default = self.collections.default_collection().await?;
        let today = Utc::now().date_naive();
        for video in &report.videos {
            if let Err(error) = self
                .db
                .add_video_to_collection(&default.id, &video.id, video.platform)
                .await
            {
                tracing::warn!(video_id = %video.id, %error, "Filing into Default collection failed");
            }
            if let Err(error) = self.snapshots.capture(&video.id, video.platform, today).await {
                tracing::warn!(video_id = %video.id, %error, "Snapshot after ingest failed");
            }
        }

        Ok(TargetOutcome {
            target: target.clone(),
            report,
        })
    }

    async fn rescrape_account(&self, account: &Account) -> Result<usize, AppError> {
        let target = ScrapeTarget::profile(account.platform, &account.username);
        let items = self.fetch(&target, self.profile_limit).await?;
        let report = self.ingest.apply_values(items).await;

        // Keep the account current even when the profile returned nothing.
        self.db
            .sync_account(&account.username, account.platform, None, None, Utc::now())
            .await?;

        Ok(report.videos.len())
    }

    /// Run the full cycle for `today`.
    ///
    /// Account failures are isolated and reported; the snapshot phase always runs.
    pub async fn run_daily_cycle(
        &self,
        today: NaiveDate,
        trigger: CycleTrigger,
    ) -> Result<CycleReport, AppError> {
        let cycle_started = Instant::now();
        DAILY_CYCLES_TOTAL.with_label_values(&[trigger.as_str()]).inc();

        let accounts = self.db.list_active_accounts().await?;
        tracing::info!(accounts = accounts.len(), %today, trigger = trigger.as_str(), "Daily cycle started");

        let phase_started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_accounts));
        let mut tasks = Vec::with_capacity(accounts.len());

        for account in accounts.iter().cloned() {
            let semaphore = semaphore.clone();
            let orchestrator = self.clone();

            tasks.push(tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => orchestrator.rescrape_account(&account).await,
                    Err(error) => Err(AppError::Internal(error.into())),
                };
                (account, result)
            }));
        }

        let mut accounts_scraped = 0;
        let mut accounts_failed = Vec::new();
        let mut videos_upserted = 0;

        for task in tasks {
            match task.await {
                Ok((_, Ok(count))) => {
                    accounts_scraped += 1;
                    videos_upserted += count;
                }
                Ok((account, Err(error))) => {
                    tracing::warn!(username = %account.username, platform = %account.platform, %error, "Account re-scrape failed");
                    accounts_failed.push(AccountFailure {
                        username: account.username,
                        platform: account.platform,
                        error: error.to_string(),
                    });
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "Account re-scrape task panicked");
                }
            }
        }
        DAILY_CYCLE_DURATION_SECONDS
            .with_label_values(&["ingest"])
            .observe(phase_started.elapsed().as_secs_f64());

        let phase_started = Instant::now();
        let snapshots = self.snapshots.capture_all(today).await?;
        DAILY_CYCLE_DURATION_SECONDS
            .with_label_values(&["snapshot"])
            .observe(phase_started.elapsed().as_secs_f64());
        DAILY_CYCLE_DURATION_SECONDS
            .with_label_values(&["total"])
            .observe(cycle_started.elapsed().as_secs_f64());

        tracing::info!(
            accounts_scraped,
            accounts_failed = accounts_failed.len(),
            videos_upserted,
            snapshots_created = snapshots.created,
            snapshots_updated = snapshots.updated,
            elapsed_ms = cycle_started.elapsed().as_millis() as u64,
            "Daily cycle complete"
        );

        Ok(CycleReport {
            trigger,
            accounts_total: accounts.len(),
            accounts_scraped,
            accounts_failed,
            videos_upserted,
            snapshots,
        })
    }
}
