//! Account service
//!
//! Creator aggregates. Totals are always recomputed from the video
//! store, never adjusted incrementally.

use chrono::Utc;
use std::sync::Arc;

use crate::data::{Account, Creator, Database, EntityId, Platform, Video};
use crate::error::AppError;

fn normalize_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim().trim_start_matches('@');
    if trimmed.is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Upsert and reactivate the account, then recompute its totals.
    pub async fn sync(
        &self,
        username: &str,
        platform: Platform,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<Account, AppError> {
        let username = normalize_username(username)?;
        self.db
            .sync_account(&username, platform, nickname, avatar, Utc::now())
            .await
    }

    /// Start tracking an account before any of its videos are ingested.
    ///
    /// # Errors
    /// `Conflict` if (username, platform) is already tracked.
    pub async fn create(
        &self,
        username: &str,
        platform: Platform,
        nickname: Option<String>,
        profile_url: Option<String>,
    ) -> Result<Account, AppError> {
        let username = normalize_username(username)?;
        let now = Utc::now();

        let account = Account {
            id: EntityId::new().0,
            profile_url: profile_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| platform.profile_url(&username)),
            username,
            platform,
            nickname: nickname.filter(|n| !n.trim().is_empty()),
            avatar: None,
            total_videos: 0,
            total_views: 0,
            total_likes: 0,
            is_active: true,
            first_tracked: now,
            last_scraped: None,
            created_at: now,
            updated_at: now,
        };

        if !self.db.insert_account(&account).await? {
            return Err(AppError::Conflict(format!(
                "account {} on {} is already tracked",
                account.username, account.platform
            )));
        }

        tracing::info!(username = %account.username, platform = %account.platform, "Account created");

        // Videos may already exist for this author.
        self.db
            .refresh_account(&account.id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get(&self, id: &str) -> Result<Account, AppError> {
        self.db.get_account(id).await?.ok_or(AppError::NotFound)
    }

    /// Active accounts, highest total views first
    pub async fn list(
        &self,
        platform: Option<Platform>,
        collection_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, AppError> {
        self.db
            .list_accounts(platform, collection_id, limit, offset)
            .await
    }

    /// Recompute totals from the current video rows.
    pub async fn refresh(&self, id: &str) -> Result<Account, AppError> {
        self.db.refresh_account(id).await?.ok_or(AppError::NotFound)
    }

    /// Soft delete. Video rows are kept; the next ingest of this author reactivates it.
    pub async fn deactivate(&self, id: &str) -> Result<(), AppError> {
        if !self.db.deactivate_account(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(account_id = %id, "Account deactivated");
        Ok(())
    }

    pub async fn videos(&self, id: &str, limit: i64, offset: i64) -> Result<Vec<Video>, AppError> {
        let account = self.get(id).await?;
        self.db
            .list_author_videos(&account.username, account.platform, limit, offset)
            .await
    }

    pub async fn creators(&self, platform: Option<Platform>) -> Result<Vec<Creator>, AppError> {
        self.db.list_creators(platform).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VideoRecord;
    use tempfile::TempDir;

    async fn create_service() -> (AccountService, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::connect(&temp_dir.path().join("test.db")).await.unwrap());
        (AccountService::new(db.clone()), db, temp_dir)
    }

    async fn ingest(db: &Database, id: &str, author: &str, views: i64) {
        let record = VideoRecord {
            id: id.to_string(),
            platform: Some(Platform::Tiktok),
            author_username: Some(author.to_string()),
            views,
            likes: views / 10,
            ..Default::default()
        };
        db.upsert_video(&record, Platform::Tiktok, Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let (service, _db, _temp_dir) = create_service().await;

        let account = service
            .create("@alice", Platform::Tiktok, None, None)
            .await
            .unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.profile_url, "https://www.tiktok.com/@alice");

        let duplicate = service.create("alice", Platform::Tiktok, None, None).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        // Same username on another platform is a different account.
        assert!(service.create("alice", Platform::Instagram, None, None).await.is_ok());
    }

    #[tokio::test]
    async fn create_picks_up_existing_videos() {
        let (service, db, _temp_dir) = create_service().await;
        ingest(&db, "1", "bob", 100).await;
        ingest(&db, "2", "bob", 50).await;

        let account = service.create("bob", Platform::Tiktok, None, None).await.unwrap();
        assert_eq!(account.total_videos, 2);
        assert_eq!(account.total_views, 150);
        assert_eq!(account.total_likes, 15);
    }

    #[tokio::test]
    async fn deactivate_hides_account_and_sync_reactivates() {
        let (service, db, _temp_dir) = create_service().await;
        ingest(&db, "1", "carol", 10).await;
        let account = service.sync("carol", Platform::Tiktok, None, None).await.unwrap();

        service.deactivate(&account.id).await.unwrap();
        assert!(service.list(None, None, 100, 0).await.unwrap().is_empty());
        assert!(service.creators(None).await.unwrap().is_empty());
        assert!(!service.get(&account.id).await.unwrap().is_active);

        let reactivated = service.sync("carol", Platform::Tiktok, None, None).await.unwrap();
        assert!(reactivated.is_active);
        assert_eq!(reactivated.id, account.id);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (service, _db, _temp_dir) = create_service().await;
        assert!(matches!(service.refresh("missing").await, Err(AppError::NotFound)));
        assert!(matches!(service.deactivate("missing").await, Err(AppError::NotFound)));
    }
}
