//! Collection service
//!
//! Named groupings of videos and accounts used as analytics scopes.
//! The "Default" collection always exists and cannot be deleted.

use chrono::Utc;
use std::sync::Arc;

use crate::data::{
    Account, Collection, CollectionSummary, DEFAULT_COLLECTION_COLOR, DEFAULT_COLLECTION_DESCRIPTION,
    DEFAULT_COLLECTION_ICON, DEFAULT_COLLECTION_NAME, Database, EntityId, Platform, Video,
};
use crate::error::AppError;

/// Fields accepted when creating or editing a collection
#[derive(Debug, Clone, Default)]
pub struct CollectionInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("collection name cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_color(color: &str) -> Result<String, AppError> {
    let hex = color.trim();
    let valid = hex.len() == 7
        && hex.starts_with('#')
        && hex[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::Validation(format!(
            "color must be a #RRGGBB hex value: {}",
            color
        )));
    }
    Ok(hex.to_string())
}

/// Collection service
pub struct CollectionService {
    db: Arc<Database>,
}

impl CollectionService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create the Default collection if it does not exist yet.
    pub async fn ensure_default(&self) -> Result<Collection, AppError> {
        if let Some(existing) = self.db.get_default_collection().await? {
            tracing::info!(collection_id = %existing.id, "Default collection exists");
            return Ok(existing);
        }

        let now = Utc::now();
        let collection = Collection {
            id: EntityId::new().0,
            name: DEFAULT_COLLECTION_NAME.to_string(),
            description: Some(DEFAULT_COLLECTION_DESCRIPTION.to_string()),
            color: DEFAULT_COLLECTION_COLOR.to_string(),
            icon: DEFAULT_COLLECTION_ICON.to_string(),
            is_default: true,
            created_at: now,
            updated_at: now,
        };

        if !self.db.insert_collection(&collection).await? {
            return Err(AppError::Conflict(format!(
                "a non-default collection named '{}' already exists",
                DEFAULT_COLLECTION_NAME
            )));
        }

        tracing::info!(collection_id = %collection.id, "Default collection created");
        Ok(collection)
    }

    pub async fn default_collection(&self) -> Result<Collection, AppError> {
        match self.db.get_default_collection().await? {
            Some(collection) => Ok(collection),
            None => self.ensure_default().await,
        }
    }

    /// # Errors
    /// `Conflict` when the name is taken.
    pub async fn create(&self, input: CollectionInput) -> Result<CollectionSummary, AppError> {
        let name = validate_name(input.name.as_deref().unwrap_or_default())?;
        let color = match input.color.as_deref() {
            Some(color) => validate_color(color)?,
            None => DEFAULT_COLLECTION_COLOR.to_string(),
        };
        let now = Utc::now();

        let collection = Collection {
            id: EntityId::new().0,
            name,
            description: input.description.filter(|d| !d.trim().is_empty()),
            color,
            icon: input
                .icon
                .filter(|i| !i.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COLLECTION_ICON.to_string()),
            is_default: false,
            created_at: now,
            updated_at: now,
        };

        if !self.db.insert_collection(&collection).await? {
            return Err(AppError::Conflict(format!(
                "collection named '{}' already exists",
                collection.name
            )));
        }

        tracing::info!(collection_id = %collection.id, name = %collection.name, "Collection created");
        self.get(&collection.id).await
    }

    pub async fn get(&self, id: &str) -> Result<CollectionSummary, AppError> {
        self.db.get_collection(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<CollectionSummary>, AppError> {
        self.db.list_collections().await
    }

    /// Apply the provided fields; omitted fields keep their value.
    pub async fn update(&self, id: &str, input: CollectionInput) -> Result<CollectionSummary, AppError> {
        let mut collection = self.get(id).await?.collection;

        if let Some(name) = input.name.as_deref() {
            let name = validate_name(name)?;
            if collection.is_default && name != collection.name {
                return Err(AppError::Validation(
                    "the default collection cannot be renamed".to_string(),
                ));
            }
            collection.name = name;
        }
        if let Some(description) = input.description {
            collection.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(color) = input.color.as_deref() {
            collection.color = validate_color(color)?;
        }
        if let Some(icon) = input.icon.filter(|i| !i.trim().is_empty()) {
            collection.icon = icon;
        }
        collection.updated_at = Utc::now();

        if !self.db.update_collection(&collection).await? {
            return Err(AppError::NotFound);
        }
        self.get(id).await
    }

    /// # Errors
    /// `Validation` for the default collection, `NotFound` for unknown ids.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let collection = self.get(id).await?.collection;
        if collection.is_default {
            return Err(AppError::Validation(
                "the default collection cannot be deleted".to_string(),
            ));
        }

        if !self.db.delete_collection(id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!(collection_id = %id, "Collection deleted");
        Ok(())
    }

    /// Idempotent: adding an existing member is a no-op.
    pub async fn add_video(
        &self,
        collection_id: &str,
        video_id: &str,
        platform: Platform,
    ) -> Result<(), AppError> {
        self.get(collection_id).await?;
        if self.db.get_video(video_id, platform).await?.is_none() {
            return Err(AppError::NotFound);
        }
        self.db
            .add_video_to_collection(collection_id, video_id, platform)
            .await?;
        Ok(())
    }

    /// # Errors
    /// `NotFound` when the video is not a member.
    pub async fn remove_video(
        &self,
        collection_id: &str,
        video_id: &str,
        platform: Platform,
    ) -> Result<(), AppError> {
        if !self
            .db
            .remove_video_from_collection(collection_id, video_id, platform)
            .await?
        {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn add_account(&self, collection_id: &str, account_id: &str) -> Result<(), AppError> {
        self.get(collection_id).await?;
        let account = self.db.get_account(account_id).await?.ok_or(AppError::NotFound)?;
        if !account.is_active {
            return Err(AppError::Validation(format!(
                "account {} is inactive",
                account.username
            )));
        }
        self.db
            .add_account_to_collection(collection_id, account_id)
            .await?;
        Ok(())
    }

    pub async fn remove_account(&self, collection_id: &str, account_id: &str) -> Result<(), AppError> {
        if !self
            .db
            .remove_account_from_collection(collection_id, account_id)
            .await?
        {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn videos(&self, collection_id: &str, limit: i64, offset: i64) -> Result<Vec<Video>, AppError> {
        self.get(collection_id).await?;
        self.db
            .list_collection_videos(collection_id, limit, offset)
            .await
    }

    pub async fn accounts(&self, collection_id: &str) -> Result<Vec<Account>, AppError> {
        self.get(collection_id).await?;
        self.db.list_collection_accounts(collection_id).await
    }

    /// Author usernames an analytics query is scoped to
    pub async fn scope_usernames(&self, collection_id: &str) -> Result<Vec<String>, AppError> {
        self.get(collection_id).await?;
        self.db.collection_usernames(collection_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::VideoRecord;
    use tempfile::TempDir;

    async fn create_service() -> (CollectionService, Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::connect(&temp_dir.path().join("test.db")).await.unwrap());
        (CollectionService::new(db.clone()), db, temp_dir)
    }

    fn named(name: &str) -> CollectionInput {
        CollectionInput {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn ensure_default_is_idempotent() {
        let (service, _db, _temp_dir) = create_service().await;
        let first = service.ensure_default().await.unwrap();
        let second = service.ensure_default().await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.is_default);
        assert_eq!(first.color, "#8B5CF6");
    }

    #[tokio::test]
    async fn default_collection_cannot_be_deleted() {
        let (service, _db, _temp_dir) = create_service().await;
        let default = service.ensure_default().await.unwrap();
        assert!(matches!(
            service.delete(&default.id).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_names_conflict() {
        let (service, _db, _temp_dir) = create_service().await;
        service.create(named("Launch")).await.unwrap();
        let other = service.create(named("Evergreen")).await.unwrap();

        assert!(matches!(
            service.create(named("Launch")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.update(&other.collection.id, named("Launch")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn membership_add_is_idempotent_and_remove_requires_member() {
        let (service, db, _temp_dir) = create_service().await;
        let collection = service.create(named("Q3")).await.unwrap();
        let record = VideoRecord {
            id: "v1".to_string(),
            platform: Some(Platform::Tiktok),
            ..Default::default()
        };
        db.upsert_video(&record, Platform::Tiktok, Utc::now())
            .await
            .unwrap();

        let id = &collection.collection.id;
        service.add_video(id, "v1", Platform::Tiktok).await.unwrap();
        service.add_video(id, "v1", Platform::Tiktok).await.unwrap();
        assert_eq!(service.get(id).await.unwrap().video_count, 1);

        service.remove_video(id, "v1", Platform::Tiktok).await.unwrap();
        assert!(matches!(
            service.remove_video(id, "v1", Platform::Tiktok).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.add_video(id, "missing", Platform::Tiktok).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn invalid_color_is_rejected() {
        let (service, _db, _temp_dir) = create_service().await;
        let input = CollectionInput {
            name: Some("Colors".to_string()),
            color: Some("purple".to_string()),
            ..Default::default()
        };
        assert!(matches!(service.create(input).await, Err(AppError::Validation(_))));
    }
}
