//! Ingestion service
//!
//! Applies canonical video records to the store and keeps the author's
//! aggregate in sync. Batches are partial-failure: every record succeeds
//! or fails on its own.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::data::{Database, UpsertedVideo, Video, VideoRecord};
use crate::error::AppError;
use crate::metrics::{INGEST_ERRORS_TOTAL, RECORDS_INGESTED_TOTAL};

/// One rejected or failed record in a batch
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    pub index: usize,
    pub id: Option<String>,
    pub error: String,
}

/// Successes and failures of a batch, always reported together
#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
    pub videos: Vec<Video>,
    pub inserted: usize,
    pub updated: usize,
    pub errors: Vec<RecordError>,
}

impl IngestReport {
    fn push_error(&mut self, index: usize, id: Option<String>, error: &AppError) {
        INGEST_ERRORS_TOTAL.with_label_values(&[error.kind()]).inc();
        self.errors.push(RecordError {
            index,
            id,
            error: error.to_string(),
        });
    }
}

/// Result of applying a single record
#[derive(Debug, Clone)]
pub struct AppliedVideo {
    pub video: Video,
    pub inserted: bool,
}

/// Ingestion service
pub struct IngestService {
    db: Arc<Database>,
}

impl IngestService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Upsert one record, then resync its author's aggregate and, when the
    /// author changed, the previous author's.
    ///
    /// # Errors
    /// `Validation` when the id is blank or the platform is missing.
    pub async fn apply(&self, record: &VideoRecord) -> Result<AppliedVideo, AppError> {
        let platform = record.validate()?;
        let now = Utc::now();

        let UpsertedVideo {
            video,
            inserted,
            previous_author,
        } = self.db.upsert_video(record, platform, now).await?;

        let outcome = if inserted { "inserted" } else { "updated" };
        RECORDS_INGESTED_TOTAL
            .with_label_values(&[platform.as_str(), outcome])
            .inc();
        tracing::debug!(video_id = %video.id, %platform, outcome, "Video record applied");

        if let Some(username) = video.author_username.as_deref() {
            self.db
                .sync_account(
                    username,
                    platform,
                    video.author_nickname.as_deref(),
                    video.author_avatar.as_deref(),
                    now,
                )
                .await?;
        }

        // The video moved away from its previous author.
        if let Some(previous) = previous_author
            .as_deref()
            .filter(|previous| video.author_username.as_deref() != Some(*previous))
        {
            self.db.recount_author(previous, platform, now).await?;
        }

        Ok(AppliedVideo { video, inserted })
    }

    /// Apply typed records independently.
    pub async fn apply_batch(&self, records: &[VideoRecord]) -> IngestReport {
        let mut report = IngestReport::default();

        for (index, record) in records.iter().enumerate() {
            match self.apply(record).await {
                Ok(applied) => {
                    if applied.inserted {
                        report.inserted += 1;
                    } else {
                        report.updated += 1;
                    }
                    report.videos.push(applied.video);
                }
                Err(error) => {
                    tracing::warn!(index, video_id = %record.id, %error, "Skipping video record");
                    let id = Some(record.id.clone()).filter(|id| !id.trim().is_empty());
                    report.push_error(index, id, &error);
                }
            }
        }

        log_summary(&report);
        report
    }

    /// Apply raw JSON items; an item that does not parse fails alone.
    pub async fn apply_values(&self, items: Vec<serde_json::Value>) -> IngestReport {
        let mut records = Vec::with_capacity(items.len());
        let mut parse_errors = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let id = item.get("id").and_then(|v| v.as_str()).map(str::to_string);
            match serde_json::from_value::<VideoRecord>(item) {
                Ok(record) => records.push((index, record)),
                Err(e) => parse_errors.push((
                    index,
                    id,
                    AppError::Validation(format!("malformed video record: {}", e)),
                )),
            }
        }

        let typed: Vec<VideoRecord> = records.iter().map(|(_, r)| r.clone()).collect();
        let mut report = self.apply_batch(&typed).await;

        // Map batch positions back to the caller's indices.
        for error in &mut report.errors {
            error.index = records[error.index].0;
        }
        for (index, id, error) in parse_errors {
            report.push_error(index, id, &error);
        }
        report.errors.sort_by_key(|e| e.index);

        report
    }
}

fn log_summary(report: &IngestReport) {
    tracing::info!(
        inserted = report.inserted,
        updated = report.updated,
        failed = report.errors.len(),
        "Batch ingestion complete"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Platform;
    use tempfile::TempDir;

    async fn create_service() -> (IngestService, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::connect(&temp_dir.path().join("test.db")).await.unwrap());
        (IngestService::new(db.clone()), db, temp_dir)
    }

    fn record(id: &str, author: &str, views: i64) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            platform: Some(Platform::Tiktok),
            url: format!("https://www.tiktok.com/@{}/video/{}", author, id),
            author_username: Some(author.to_string()),
            author_nickname: Some(author.to_uppercase()),
            views,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn identical_record_twice_keeps_one_row() {
        let (service, db, _temp_dir) = create_service().await;

        let first = service.apply(&record("1", "alice", 100)).await.unwrap();
        let second = service.apply(&record("1", "alice", 100)).await.unwrap();

        assert!(first.inserted);
        assert!(!second.inserted);
        assert_eq!(second.video.created_at, first.video.created_at);
        assert!(second.video.scraped_at >= first.video.scraped_at);

        let (videos, total) = db
            .list_videos(&Default::default(), 50, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(videos[0].views, 100);
    }

    #[tokio::test]
    async fn batch_continues_past_invalid_records() {
        let (service, _db, _temp_dir) = create_service().await;

        let mut missing_platform = record("2", "alice", 5);
        missing_platform.platform = None;
        let records = vec![record("1", "alice", 10), missing_platform, record("3", "alice", 30)];

        let report = service.apply_batch(&records).await;
        assert_eq!(report.inserted, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].index, 1);
        assert_eq!(report.errors[0].id.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn malformed_json_items_fail_individually() {
        let (service, _db, _temp_dir) = create_service().await;

        let items = vec![
            serde_json::json!({"id": "9", "platform": "myspace"}),
            serde_json::json!({"id": "10", "platform": "tiktok", "views": 40}),
            serde_json::json!({"platform": "tiktok"}),
        ];

        let report = service.apply_values(items).await;
        assert_eq!(report.inserted, 1);
        assert_eq!(
            report.errors.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(report.errors[0].id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn reassigned_video_leaves_previous_author() {
        let (service, db, _temp_dir) = create_service().await;

        service.apply(&record("1", "alice", 100)).await.unwrap();
        service.apply(&record("2", "alice", 40)).await.unwrap();
        service.apply(&record("1", "bob", 100)).await.unwrap();

        let alice = db
            .get_account_by_username("alice", Platform::Tiktok)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.total_videos, 1);
        assert_eq!(alice.total_views, 40);

        let bob = db
            .get_account_by_username("bob", Platform::Tiktok)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bob.total_videos, 1);
        assert_eq!(bob.total_views, 100);

        // Dropping the author entirely also releases the video.
        let mut anonymous = record("2", "alice", 40);
        anonymous.author_username = None;
        service.apply(&anonymous).await.unwrap();

        let alice = db
            .get_account_by_username("alice", Platform::Tiktok)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.total_videos, 0);
        assert_eq!(alice.total_views, 0);
    }

    #[tokio::test]
    async fn account_totals_do_not_depend_on_order() {
        let (service, db, _temp_dir) = create_service().await;

        service.apply(&record("b", "alice", 200)).await.unwrap();
        service.apply(&record("a", "alice", 100)).await.unwrap();
        service.apply(&record("b", "alice", 250)).await.unwrap();
        service.apply(&record("c", "alice", 300)).await.unwrap();

        let account = db
            .get_account_by_username("alice", Platform::Tiktok)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.total_videos, 3);
        assert_eq!(account.total_views, 650);
        assert_eq!(account.nickname.as_deref(), Some("ALICE"));
    }
}
