//! Snapshot service
//!
//! One metrics snapshot per video per calendar day, with growth measured
//! against the latest earlier snapshot.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::data::{Database, Platform, SnapshotOutcome, VideoSnapshot};
use crate::error::AppError;
use crate::metrics::SNAPSHOTS_TOTAL;

/// A video whose capture failed
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotFailure {
    pub video_id: String,
    pub platform: Platform,
    pub error: String,
}

/// Outcome of a capture pass over all videos
#[derive(Debug, Default, Serialize)]
pub struct SnapshotReport {
    pub snapshot_date: Option<NaiveDate>,
    pub created: usize,
    pub updated: usize,
    pub failed: Vec<SnapshotFailure>,
}

/// Snapshot service
#[derive(Clone)]
pub struct SnapshotService {
    db: Arc<Database>,
    max_concurrent: usize,
}

impl SnapshotService {
    pub fn new(db: Arc<Database>, max_concurrent: usize) -> Self {
        Self {
            db,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Capture `today`'s snapshot for one video.
    pub async fn capture(
        &self,
        video_id: &str,
        platform: Platform,
        today: NaiveDate,
    ) -> Result<(VideoSnapshot, SnapshotOutcome), AppError> {
        let (snapshot, outcome) = self
            .db
            .capture_snapshot(video_id, platform, today, Utc::now())
            .await?;

        let label = match outcome {
            SnapshotOutcome::Created => "created",
            SnapshotOutcome::Updated => "updated",
        };
        SNAPSHOTS_TOTAL.with_label_values(&[label]).inc();
        tracing::debug!(
            %video_id,
            %platform,
            %today,
            views_growth = snapshot.views_growth,
            outcome = label,
            "Snapshot captured"
        );

        Ok((snapshot, outcome))
    }

    /// Capture every tracked video with bounded parallelism.
    ///
    /// A failing video is recorded in the report and does not stop the others.
    pub async fn capture_all(&self, today: NaiveDate) -> Result<SnapshotReport, AppError> {
        let keys = self.db.list_video_keys().await?;
        tracing::info!(videos = keys.len(), %today, "Capturing daily snapshots");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = Vec::with_capacity(keys.len());

        for (video_id, platform) in keys {
            let semaphore = semaphore.clone();
            let service = self.clone();

            tasks.push(tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => service.capture(&video_id, platform, today).await,
                    Err(error) => Err(AppError::Internal(error.into())),
                };
                (video_id, platform, result)
            }));
        }

        let mut report = SnapshotReport {
            snapshot_date: Some(today),
            ..Default::default()
        };

        for task in tasks {
            match task.await {
                Ok((_, _, Ok((_, SnapshotOutcome::Created)))) => report.created += 1,
                Ok((_, _, Ok((_, SnapshotOutcome::Updated)))) => report.updated += 1,
                Ok((video_id, platform, Err(error))) => {
                    SNAPSHOTS_TOTAL.with_label_values(&["failed"]).inc();
                    tracing::warn!(%video_id, %platform, %error, "Snapshot capture failed");
                    report.failed.push(SnapshotFailure {
                        video_id,
                        platform,
                        error: error.to_string(),
                    });
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "Snapshot task panicked");
                }
            }
        }

        tracing::info!(
            created = report.created,
            updated = report.updated,
            failed = report.failed.len(),
            "Snapshot pass complete"
        );

        Ok(report)
    }

    pub async fn history(
        &self,
        video_id: &str,
        platform: Platform,
    ) -> Result<Vec<VideoSnapshot>, AppError> {
        if self.db.get_video(video_id, platform).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db.list_video_history(video_id, platform).await
    }
}
