//! Database tests

use super::*;
use chrono::{NaiveDate, TimeZone, Utc};
use sqlx::types::Json;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn record(id: &str, author: &str, views: i64) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        platform: Some(Platform::Tiktok),
        url: format!("https://www.tiktok.com/@{}/video/{}", author, id),
        author_username: Some(author.to_string()),
        views,
        likes: views / 10,
        comments: 1,
        ..Default::default()
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_upsert_inserts_then_updates() {
    let (db, _temp_dir) = create_test_db().await;

    let first = db
        .upsert_video(&record("1", "alice", 100), Platform::Tiktok, Utc::now())
        .await
        .unwrap();
    assert!(first.inserted);
    assert_eq!(first.previous_author, None);
    let first = first.video;

    let mut changed = record("1", "alice", 400);
    changed.hashtags = vec!["fyp".to_string()];
    let second = db
        .upsert_video(&changed, Platform::Tiktok, Utc::now())
        .await
        .unwrap();
    assert!(!second.inserted);
    assert_eq!(second.previous_author.as_deref(), Some("alice"));
    let second = second.video;
    assert_eq!(second.views, 400);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.hashtags.0, vec!["fyp".to_string()]);

    // Same id on another platform is a separate video.
    let other = db
        .upsert_video(&record("1", "alice", 5), Platform::Instagram, Utc::now())
        .await
        .unwrap();
    assert!(other.inserted);
    assert_eq!(db.list_video_keys().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_list_videos_filters() {
    let (db, _temp_dir) = create_test_db().await;

    let mut early = record("1", "alice", 10);
    early.posted_at = Some(Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap());
    let mut late = record("2", "bob", 20);
    late.posted_at = Some(Utc.with_ymd_and_hms(2025, 4, 10, 23, 59, 0).unwrap());
    late.is_spark_ad = true;

    for r in [&early, &late] {
        db.upsert_video(r, Platform::Tiktok, Utc::now()).await.unwrap();
    }

    let by_creator = VideoListFilter {
        creator: Some("alice".to_string()),
        ..Default::default()
    };
    let (videos, total) = db.list_videos(&by_creator, 50, 0).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(videos[0].id, "1");

    let by_date = VideoListFilter {
        date_from: Some(day(5)),
        date_to: Some(day(10)),
        ..Default::default()
    };
    let (videos, _) = db.list_videos(&by_date, 50, 0).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "2");

    let ads = VideoListFilter {
        is_spark_ad: Some(true),
        ..Default::default()
    };
    assert_eq!(db.list_videos(&ads, 50, 0).await.unwrap().1, 1);

    let (page, total) = db.list_videos(&Default::default(), 1, 1).await.unwrap();
    assert_eq!(total, 2);
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_sync_account_recomputes_totals() {
    let (db, _temp_dir) = create_test_db().await;

    for (id, views) in [("1", 100), ("2", 200), ("3", 300)] {
        db.upsert_video(&record(id, "alice", views), Platform::Tiktok, Utc::now())
            .await
            .unwrap();
    }
    let account = db
        .sync_account("alice", Platform::Tiktok, Some("Alice"), None, Utc::now())
        .await
        .unwrap();

    assert_eq!(account.total_videos, 3);
    assert_eq!(account.total_views, 600);
    assert_eq!(account.total_likes, 60);
    assert_eq!(account.nickname.as_deref(), Some("Alice"));

    // A later sync without a nickname keeps the stored one.
    let again = db
        .sync_account("alice", Platform::Tiktok, None, None, Utc::now())
        .await
        .unwrap();
    assert_eq!(again.id, account.id);
    assert_eq!(again.nickname.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_deactivate_account_drops_collection_membership() {
    let (db, _temp_dir) = create_test_db().await;
    let account = db
        .sync_account("carol", Platform::Instagram, None, None, Utc::now())
        .await
        .unwrap();

    let now = Utc::now();
    let collection = Collection {
        id: EntityId::new().0,
        name: "Watchlist".to_string(),
        description: None,
        color: DEFAULT_COLLECTION_COLOR.to_string(),
        icon: DEFAULT_COLLECTION_ICON.to_string(),
        is_default: false,
        created_at: now,
        updated_at: now,
    };
    assert!(db.insert_collection(&collection).await.unwrap());
    assert!(db.add_account_to_collection(&collection.id, &account.id).await.unwrap());
    assert_eq!(db.get_collection(&collection.id).await.unwrap().unwrap().account_count, 1);

    assert!(db.deactivate_account(&account.id).await.unwrap());
    assert_eq!(db.count_active_accounts().await.unwrap(), 0);
    assert_eq!(db.get_collection(&collection.id).await.unwrap().unwrap().account_count, 0);
    assert!(!db.deactivate_account("missing").await.unwrap());
}

#[tokio::test]
async fn test_collection_name_is_unique() {
    let (db, _temp_dir) = create_test_db().await;
    let now = Utc::now();
    let make = |name: &str| Collection {
        id: EntityId::new().0,
        name: name.to_string(),
        description: None,
        color: DEFAULT_COLLECTION_COLOR.to_string(),
        icon: DEFAULT_COLLECTION_ICON.to_string(),
        is_default: false,
        created_at: now,
        updated_at: now,
    };

    assert!(db.insert_collection(&make("Spring")).await.unwrap());
    assert!(!db.insert_collection(&make("Spring")).await.unwrap());
    assert_eq!(db.list_collections().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_snapshot_one_row_per_day() {
    let (db, _temp_dir) = create_test_db().await;
    db.upsert_video(&record("1", "alice", 100), Platform::Tiktok, Utc::now())
        .await
        .unwrap();

    let (_, outcome) = db
        .capture_snapshot("1", Platform::Tiktok, day(1), Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, SnapshotOutcome::Created);

    let (_, outcome) = db
        .capture_snapshot("1", Platform::Tiktok, day(1), Utc::now())
        .await
        .unwrap();
    assert_eq!(outcome, SnapshotOutcome::Updated);

    db.upsert_video(&record("1", "alice", 160), Platform::Tiktok, Utc::now())
        .await
        .unwrap();
    let (snapshot, _) = db
        .capture_snapshot("1", Platform::Tiktok, day(2), Utc::now())
        .await
        .unwrap();
    assert_eq!(snapshot.views_growth, 60);
    assert_eq!(snapshot.likes_growth, 6);

    let history = db.list_video_history("1", Platform::Tiktok).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].snapshot_date, day(1));
}

#[tokio::test]
async fn test_cohort_queries() {
    let (db, _temp_dir) = create_test_db().await;
    let mut organic = record("1", "alice", 100);
    organic.posted_at = Some(Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap());
    let mut ad = record("2", "bob", 300);
    ad.is_spark_ad = true;
    ad.posted_at = Some(Utc.with_ymd_and_hms(2025, 4, 2, 18, 0, 0).unwrap());

    for r in [&organic, &ad] {
        db.upsert_video(r, Platform::Tiktok, Utc::now()).await.unwrap();
        db.capture_snapshot(&r.id, Platform::Tiktok, day(3), Utc::now())
            .await
            .unwrap();
    }

    let all = CohortFilter::default();
    assert_eq!(db.cohort_totals(&all).await.unwrap().views, 400);

    let only_ads = CohortFilter {
        is_spark_ad: Some(true),
        ..Default::default()
    };
    assert_eq!(db.cohort_totals(&only_ads).await.unwrap().views, 300);

    let nobody = CohortFilter {
        usernames: Some(Vec::new()),
        ..Default::default()
    };
    assert_eq!(db.cohort_totals(&nobody).await.unwrap(), MetricTotals::default());

    let per_day = db.cohort_views_by_posted_day(&all).await.unwrap();
    assert_eq!(per_day, vec![(day(2), 400)]);

    let growth = db.daily_growth(&all, day(1), day(5)).await.unwrap();
    assert_eq!(growth.len(), 1);
    assert_eq!(growth[0].snapshot_date, day(3));
    assert_eq!(growth[0].views, 400);

    let alice = CohortFilter {
        usernames: Some(vec!["alice".to_string()]),
        ..Default::default()
    };
    let videos = db.cohort_videos(&alice).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "1");
}

#[tokio::test]
async fn test_job_roundtrip_and_recovery() {
    let (db, _temp_dir) = create_test_db().await;
    let mut job = IngestJob {
        id: EntityId::new().0,
        status: JobStatus::Pending,
        targets: Json(vec!["https://www.tiktok.com/@alice".to_string()]),
        total: 1,
        processed: 0,
        videos_upserted: 0,
        error_count: 0,
        errors: Json(Vec::new()),
        created_at: Utc::now(),
        started_at: None,
        finished_at: None,
    };
    db.save_job(&job).await.unwrap();

    job.status = JobStatus::Completed;
    job.processed = 1;
    job.finished_at = Some(Utc::now());
    db.save_job(&job).await.unwrap();

    let stored = db.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.processed, 1);
    assert_eq!(stored.targets.0.len(), 1);

    // Finished jobs are left alone.
    assert_eq!(db.fail_interrupted_jobs().await.unwrap(), 0);
    assert_eq!(db.list_jobs(10).await.unwrap().len(), 1);
}
