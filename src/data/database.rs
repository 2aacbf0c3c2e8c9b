//! SQLite database operations
//!
//! All database access goes through this module.
//! Multi-statement writes run inside `BEGIN IMMEDIATE` so each
//! per-key read-merge-write is atomic against concurrent writers.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use std::path::Path;
use std::time::Duration;

use super::models::*;
use crate::error::AppError;

const MAX_CONNECTIONS: u32 = 8;
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

fn map_unique_violation(error: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Conflict(message())
        }
        _ => AppError::Database(error),
    }
}

fn push_video_list_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a VideoListFilter) {
    if let Some(platform) = filter.platform {
        qb.push(" AND v.platform = ").push_bind(platform);
    }
    if let Some(creator) = &filter.creator {
        qb.push(" AND v.author_username = ").push_bind(creator);
    }
    if let Some(date_from) = filter.date_from {
        qb.push(" AND v.posted_at IS NOT NULL AND substr(v.posted_at, 1, 10) >= ")
            .push_bind(date_from);
    }
    if let Some(date_to) = filter.date_to {
        qb.push(" AND v.posted_at IS NOT NULL AND substr(v.posted_at, 1, 10) <= ")
            .push_bind(date_to);
    }
    if let Some(is_spark_ad) = filter.is_spark_ad {
        qb.push(" AND v.is_spark_ad = ").push_bind(is_spark_ad);
    }
}

/// Append the cohort predicates for alias `v` to a query that already has a WHERE clause.
fn push_cohort_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a CohortFilter) {
    if !filter.platforms.is_empty() {
        qb.push(" AND v.platform IN (");
        let mut separated = qb.separated(", ");
        for platform in &filter.platforms {
            separated.push_bind(*platform);
        }
        separated.push_unseparated(")");
    }

    if let Some(usernames) = &filter.usernames {
        if usernames.is_empty() {
            qb.push(" AND 0 = 1");
        } else {
            qb.push(" AND v.author_username IN (");
            let mut separated = qb.separated(", ");
            for username in usernames {
                separated.push_bind(username);
            }
            separated.push_unseparated(")");
        }
    }

    if let Some(is_spark_ad) = filter.is_spark_ad {
        qb.push(" AND v.is_spark_ad = ").push_bind(is_spark_ad);
    }
    if let Some(from) = filter.posted_from {
        qb.push(" AND v.posted_at IS NOT NULL AND substr(v.posted_at, 1, 10) >= ")
            .push_bind(from);
    }
    if let Some(to) = filter.posted_to {
        qb.push(" AND v.posted_at IS NOT NULL AND substr(v.posted_at, 1, 10) <= ")
            .push_bind(to);
    }
}

async fn write_video(conn: &mut SqliteConnection, video: &Video) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO videos (
            id, platform, url, thumbnail, caption,
            author_username, author_nickname, author_avatar, author_id,
            views, likes, comments, shares, bookmarks, is_spark_ad,
            duration, hashtags, music_id, music_title, music_author,
            posted_at, scraped_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id, platform) DO UPDATE SET
            url = excluded.url,
            thumbnail = excluded.thumbnail,
            caption = excluded.caption,
            author_username = excluded.author_username,
            author_nickname = excluded.author_nickname,
            author_avatar = excluded.author_avatar,
            author_id = excluded.author_id,
            views = excluded.views,
            likes = excluded.likes,
            comments = excluded.comments,
            shares = excluded.shares,
            bookmarks = excluded.bookmarks,
            is_spark_ad = excluded.is_spark_ad,
            duration = excluded.duration,
            hashtags = excluded.hashtags,
            music_id = excluded.music_id,
            music_title = excluded.music_title,
            music_author = excluded.music_author,
            posted_at = excluded.posted_at,
            scraped_at = excluded.scraped_at
        "#,
    )
    .bind(&video.id)
    .bind(video.platform)
    .bind(&video.url)
    .bind(&video.thumbnail)
    .bind(&video.caption)
    .bind(&video.author_username)
    .bind(&video.author_nickname)
    .bind(&video.author_avatar)
    .bind(&video.author_id)
    .bind(video.views)
    .bind(video.likes)
    .bind(video.comments)
    .bind(video.shares)
    .bind(video.bookmarks)
    .bind(video.is_spark_ad)
    .bind(video.duration)
    .bind(&video.hashtags)
    .bind(&video.music_id)
    .bind(&video.music_title)
    .bind(&video.music_author)
    .bind(video.posted_at)
    .bind(video.scraped_at)
    .bind(video.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn recompute_account_totals(
    conn: &mut SqliteConnection,
    account_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE accounts SET
            total_videos = (
                SELECT COUNT(*) FROM videos v
                WHERE v.author_username = accounts.username AND v.platform = accounts.platform
            ),
            total_views = (
                SELECT COALESCE(SUM(v.views), 0) FROM videos v
                WHERE v.author_username = accounts.username AND v.platform = accounts.platform
            ),
            total_likes = (
                SELECT COALESCE(SUM(v.likes), 0) FROM videos v
                WHERE v.author_username = accounts.username AND v.platform = accounts.platform
            ),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(now)
    .bind(account_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Outcome of [`Database::upsert_video`]
#[derive(Debug, Clone)]
pub struct UpsertedVideo {
    pub video: Video,
    pub inserted: bool,
    /// Author on the row before the merge; `None` for inserts
    pub previous_author: Option<String>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    // =========================================================================
    // Video
    // =========================================================================

    /// Insert or merge a video record atomically.
    pub async fn upsert_video(
        &self,
        record: &VideoRecord,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<UpsertedVideo, AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<UpsertedVideo, AppError> = async {
            let existing = sqlx::query_as::<_, Video>(
                "SELECT * FROM videos WHERE id = ? AND platform = ?",
            )
            .bind(record.id.trim())
            .bind(platform)
            .fetch_optional(&mut *conn)
            .await?;

            let upserted = match existing {
                Some(existing) => UpsertedVideo {
                    video: merge_record(&existing, record, now),
                    inserted: false,
                    previous_author: existing.author_username,
                },
                None => UpsertedVideo {
                    video: Video::from_record(record, platform, now),
                    inserted: true,
                    previous_author: None,
                },
            };

            write_video(&mut conn, &upserted.video).await?;
            Ok(upserted)
        }
        .await;

        match result {
            Ok(value) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(value)
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    pub async fn get_video(&self, id: &str, platform: Platform) -> Result<Option<Video>, AppError> {
        let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ? AND platform = ?")
            .bind(id)
            .bind(platform)
            .fetch_optional(&self.pool)
            .await?;
        Ok(video)
    }

    /// Paginated listing, newest scrape first. Returns the page and the total match count.
    pub async fn list_videos(
        &self,
        filter: &VideoListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Video>, i64), AppError> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos v WHERE 1 = 1");
        push_video_list_filters(&mut count_query, filter);
        let total = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT v.* FROM videos v WHERE 1 = 1");
        push_video_list_filters(&mut query, filter);
        query
            .push(" ORDER BY v.scraped_at DESC, v.id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let videos = query.build_query_as::<Video>().fetch_all(&self.pool).await?;

        Ok((videos, total))
    }

    pub async fn list_author_videos(
        &self,
        username: &str,
        platform: Platform,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE author_username = ? AND platform = ?
            ORDER BY posted_at DESC, id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(username)
        .bind(platform)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    /// Flip the paid-promotion flag. Returns false when the video is unknown.
    pub async fn set_video_spark_ad(
        &self,
        id: &str,
        platform: Platform,
        is_spark_ad: bool,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE videos SET is_spark_ad = ? WHERE id = ? AND platform = ?")
            .bind(is_spark_ad)
            .bind(id)
            .bind(platform)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Identity of every tracked video
    pub async fn list_video_keys(&self) -> Result<Vec<(String, Platform)>, AppError> {
        let keys = sqlx::query_as::<_, (String, Platform)>(
            "SELECT id, platform FROM videos ORDER BY platform, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    pub async fn count_videos_by_platform(&self) -> Result<Vec<(Platform, i64)>, AppError> {
        let counts = sqlx::query_as::<_, (Platform, i64)>(
            "SELECT platform, COUNT(*) FROM videos GROUP BY platform ORDER BY platform",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Upsert the author row, reactivate it and recompute its totals from videos.
    pub async fn sync_account(
        &self,
        username: &str,
        platform: Platform,
        nickname: Option<&str>,
        avatar: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Account, AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<Account, AppError> = async {
            sqlx::query(
                r#"
                INSERT INTO accounts (
                    id, username, platform, nickname, avatar, profile_url,
                    total_videos, total_views, total_likes, is_active,
                    first_tracked, last_scraped, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, 0, 0, 0, 1, ?, ?, ?, ?)
                ON CONFLICT(username, platform) DO UPDATE SET
                    nickname = COALESCE(excluded.nickname, accounts.nickname),
                    avatar = COALESCE(excluded.avatar, accounts.avatar),
                    is_active = 1,
                    last_scraped = excluded.last_scraped,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(EntityId::new().0)
            .bind(username)
            .bind(platform)
            .bind(nickname)
            .bind(avatar)
            .bind(platform.profile_url(username))
            .bind(now)
            .bind(now)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;

            let account_id = sqlx::query_scalar::<_, String>(
                "SELECT id FROM accounts WHERE username = ? AND platform = ?",
            )
            .bind(username)
            .bind(platform)
            .fetch_one(&mut *conn)
            .await?;

            recompute_account_totals(&mut conn, &account_id, now).await?;

            let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
                .bind(&account_id)
                .fetch_one(&mut *conn)
                .await?;
            Ok(account)
        }
        .await;

        match result {
            Ok(account) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(account)
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    /// Recompute the totals of an existing (username, platform) account.
    ///
    /// Never creates or reactivates the account. Returns false when it is not tracked.
    pub async fn recount_author(
        &self,
        username: &str,
        platform: Platform,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        let account_id = sqlx::query_scalar::<_, String>(
            "SELECT id FROM accounts WHERE username = ? AND platform = ?",
        )
        .bind(username)
        .bind(platform)
        .fetch_optional(&mut *conn)
        .await?;

        match account_id {
            Some(id) => recompute_account_totals(&mut conn, &id, now).await,
            None => Ok(false),
        }
    }

    /// Recompute an account's totals without touching its active flag.
    pub async fn refresh_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let mut conn = self.pool.acquire().await?;
        if !recompute_account_totals(&mut conn, id, Utc::now()).await? {
            return Ok(None);
        }
        drop(conn);
        self.get_account(id).await
    }

    /// Insert a manually tracked account. Returns false if (username, platform) exists.
    pub async fn insert_account(&self, account: &Account) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO accounts (
                id, username, platform, nickname, avatar, profile_url,
                total_videos, total_views, total_likes, is_active,
                first_tracked, last_scraped, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.username)
        .bind(account.platform)
        .bind(&account.nickname)
        .bind(&account.avatar)
        .bind(&account.profile_url)
        .bind(account.total_videos)
        .bind(account.total_views)
        .bind(account.total_likes)
        .bind(account.is_active)
        .bind(account.first_tracked)
        .bind(account.last_scraped)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn get_account_by_username(
        &self,
        username: &str,
        platform: Platform,
    ) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE username = ? AND platform = ?",
        )
        .bind(username)
        .bind(platform)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Active accounts ordered by total views
    pub async fn list_accounts(
        &self,
        platform: Option<Platform>,
        collection_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Account>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT a.* FROM accounts a WHERE a.is_active = 1");
        if let Some(platform) = platform {
            query.push(" AND a.platform = ").push_bind(platform);
        }
        if let Some(collection_id) = collection_id {
            query
                .push(" AND a.id IN (SELECT account_id FROM account_collections WHERE collection_id = ")
                .push_bind(collection_id)
                .push(")");
        }
        query
            .push(" ORDER BY a.total_views DESC, a.username ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let accounts = query.build_query_as::<Account>().fetch_all(&self.pool).await?;
        Ok(accounts)
    }

    pub async fn list_active_accounts(&self) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE is_active = 1 ORDER BY platform, username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    pub async fn count_active_accounts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Soft delete: clear the active flag and drop all collection memberships.
    pub async fn deactivate_account(&self, id: &str) -> Result<bool, AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<bool, AppError> = async {
            let updated = sqlx::query("UPDATE accounts SET is_active = 0, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *conn)
                .await?;
            if updated.rows_affected() == 0 {
                return Ok(false);
            }

            sqlx::query("DELETE FROM account_collections WHERE account_id = ?")
                .bind(id)
                .execute(&mut *conn)
                .await?;
            Ok(true)
        }
        .await;

        match result {
            Ok(found) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(found)
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    /// Distinct active creators for filter dropdowns
    pub async fn list_creators(&self, platform: Option<Platform>) -> Result<Vec<Creator>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT username, platform, nickname, total_videos FROM accounts WHERE is_active = 1",
        );
        if let Some(platform) = platform {
            query.push(" AND platform = ").push_bind(platform);
        }
        query.push(" ORDER BY username ASC, platform ASC");

        let creators = query.build_query_as::<Creator>().fetch_all(&self.pool).await?;
        Ok(creators)
    }

    // =========================================================================
    // Collection
    // =========================================================================

    /// Insert a collection. Returns false if the name is taken.
    pub async fn insert_collection(&self, collection: &Collection) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO collections (
                id, name, description, color, icon, is_default, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&collection.id)
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(&collection.color)
        .bind(&collection.icon)
        .bind(collection.is_default)
        .bind(collection.created_at)
        .bind(collection.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_collection(&self, collection: &Collection) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE collections
            SET name = ?, description = ?, color = ?, icon = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&collection.name)
        .bind(&collection.description)
        .bind(&collection.color)
        .bind(&collection.icon)
        .bind(collection.updated_at)
        .bind(&collection.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                format!("collection named '{}' already exists", collection.name)
            })
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a non-default collection. Returns false if nothing was deleted.
    pub async fn delete_collection(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM collections WHERE id = ? AND is_default = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get_collection(&self, id: &str) -> Result<Option<CollectionSummary>, AppError> {
        let collection = sqlx::query_as::<_, CollectionSummary>(
            r#"
            SELECT c.*,
                (SELECT COUNT(*) FROM video_collections vc WHERE vc.collection_id = c.id) AS video_count,
                (SELECT COUNT(*) FROM account_collections ac WHERE ac.collection_id = c.id) AS account_count
            FROM collections c
            WHERE c.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(collection)
    }

    pub async fn get_default_collection(&self) -> Result<Option<Collection>, AppError> {
        let collection = sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE is_default = 1 ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(collection)
    }

    /// All collections with counts, default first then newest.
    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, AppError> {
        let collections = sqlx::query_as::<_, CollectionSummary>(
            r#"
            SELECT c.*,
                COUNT(DISTINCT vc.video_id || ':' || vc.platform) AS video_count,
                COUNT(DISTINCT ac.account_id) AS account_count
            FROM collections c
            LEFT JOIN video_collections vc ON vc.collection_id = c.id
            LEFT JOIN account_collections ac ON ac.collection_id = c.id
            GROUP BY c.id
            ORDER BY c.is_default DESC, c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(collections)
    }

    /// Returns true if a new membership row was created
    pub async fn add_video_to_collection(
        &self,
        collection_id: &str,
        video_id: &str,
        platform: Platform,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO video_collections (collection_id, video_id, platform, added_at) VALUES (?, ?, ?, ?)",
        )
        .bind(collection_id)
        .bind(video_id)
        .bind(platform)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_video_from_collection(
        &self,
        collection_id: &str,
        video_id: &str,
        platform: Platform,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM video_collections WHERE collection_id = ? AND video_id = ? AND platform = ?",
        )
        .bind(collection_id)
        .bind(video_id)
        .bind(platform)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_account_to_collection(
        &self,
        collection_id: &str,
        account_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO account_collections (collection_id, account_id, added_at) VALUES (?, ?, ?)",
        )
        .bind(collection_id)
        .bind(account_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove_account_from_collection(
        &self,
        collection_id: &str,
        account_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM account_collections WHERE collection_id = ? AND account_id = ?",
        )
        .bind(collection_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_collection_videos(
        &self,
        collection_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>, AppError> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT v.* FROM videos v
            JOIN video_collections vc ON vc.video_id = v.id AND vc.platform = v.platform
            WHERE vc.collection_id = ?
            ORDER BY vc.added_at DESC, v.id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(collection_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(videos)
    }

    pub async fn list_collection_accounts(&self, collection_id: &str) -> Result<Vec<Account>, AppError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.* FROM accounts a
            JOIN account_collections ac ON ac.account_id = a.id
            WHERE ac.collection_id = ? AND a.is_active = 1
            ORDER BY a.total_views DESC, a.username ASC
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// Author usernames of the accounts in a collection
    pub async fn collection_usernames(&self, collection_id: &str) -> Result<Vec<String>, AppError> {
        let usernames = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT a.username FROM accounts a
            JOIN account_collections ac ON ac.account_id = a.id
            WHERE ac.collection_id = ?
            ORDER BY a.username
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(usernames)
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Record today's metrics for one video.
    ///
    /// A second capture on the same day refreshes the cumulative columns and
    /// leaves growth untouched. A first capture computes growth against the
    /// latest earlier snapshot, whatever the gap.
    pub async fn capture_snapshot(
        &self,
        video_id: &str,
        platform: Platform,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(VideoSnapshot, SnapshotOutcome), AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result: Result<(VideoSnapshot, SnapshotOutcome), AppError> = async {
            let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = ? AND platform = ?")
                .bind(video_id)
                .bind(platform)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(AppError::NotFound)?;
            let current = video.metrics();

            let existing = sqlx::query_as::<_, VideoSnapshot>(
                "SELECT * FROM video_history WHERE video_id = ? AND platform = ? AND snapshot_date = ?",
            )
            .bind(video_id)
            .bind(platform)
            .bind(today)
            .fetch_optional(&mut *conn)
            .await?;

            let outcome = if let Some(existing) = existing {
                sqlx::query(
                    r#"
                    UPDATE video_history
                    SET views = ?, likes = ?, comments = ?, shares = ?, saves = ?
                    WHERE id = ?
                    "#,
                )
                .bind(current.views)
                .bind(current.likes)
                .bind(current.comments)
                .bind(current.shares)
                .bind(current.saves)
                .bind(existing.id)
                .execute(&mut *conn)
                .await?;
                SnapshotOutcome::Updated
            } else {
                let previous = sqlx::query_as::<_, VideoSnapshot>(
                    r#"
                    SELECT * FROM video_history
                    WHERE video_id = ? AND platform = ? AND snapshot_date < ?
                    ORDER BY snapshot_date DESC
                    LIMIT 1
                    "#,
                )
                .bind(video_id)
                .bind(platform)
                .bind(today)
                .fetch_optional(&mut *conn)
                .await?;

                let growth = Growth::between(&current, previous.map(|p| p.metrics()).as_ref());

                sqlx::query(
                    r#"
                    INSERT INTO video_history (
                        video_id, platform, views, likes, comments, shares, saves,
                        views_growth, likes_growth, comments_growth, snapshot_date, created_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(video_id)
                .bind(platform)
                .bind(current.views)
                .bind(current.likes)
                .bind(current.comments)
                .bind(current.shares)
                .bind(current.saves)
                .bind(growth.views)
                .bind(growth.likes)
                .bind(growth.comments)
                .bind(today)
                .bind(now)
                .execute(&mut *conn)
                .await?;
                SnapshotOutcome::Created
            };

            let snapshot = sqlx::query_as::<_, VideoSnapshot>(
                "SELECT * FROM video_history WHERE video_id = ? AND platform = ? AND snapshot_date = ?",
            )
            .bind(video_id)
            .bind(platform)
            .bind(today)
            .fetch_one(&mut *conn)
            .await?;

            Ok((snapshot, outcome))
        }
        .await;

        match result {
            Ok(value) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(value)
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    pub async fn list_video_history(
        &self,
        video_id: &str,
        platform: Platform,
    ) -> Result<Vec<VideoSnapshot>, AppError> {
        let snapshots = sqlx::query_as::<_, VideoSnapshot>(
            "SELECT * FROM video_history WHERE video_id = ? AND platform = ? ORDER BY snapshot_date ASC",
        )
        .bind(video_id)
        .bind(platform)
        .fetch_all(&self.pool)
        .await?;
        Ok(snapshots)
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    /// Cohort-wide metric sums computed in SQL
    pub async fn cohort_totals(&self, filter: &CohortFilter) -> Result<MetricTotals, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COALESCE(SUM(v.views), 0),
                COALESCE(SUM(v.likes), 0),
                COALESCE(SUM(v.comments), 0),
                COALESCE(SUM(v.shares), 0),
                COALESCE(SUM(v.bookmarks), 0)
            FROM videos v WHERE 1 = 1
            "#,
        );
        push_cohort_filters(&mut query, filter);

        let (views, likes, comments, shares, saves) = query
            .build_query_as::<(i64, i64, i64, i64, i64)>()
            .fetch_one(&self.pool)
            .await?;

        Ok(MetricTotals {
            views,
            likes,
            comments,
            shares,
            saves,
        })
    }

    /// Every video in the cohort, most viewed first
    pub async fn cohort_videos(&self, filter: &CohortFilter) -> Result<Vec<Video>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT v.* FROM videos v WHERE 1 = 1");
        push_cohort_filters(&mut query, filter);
        query.push(" ORDER BY v.views DESC, v.id ASC");

        let videos = query.build_query_as::<Video>().fetch_all(&self.pool).await?;
        Ok(videos)
    }

    /// Sum of views per posted day for the cohort
    pub async fn cohort_views_by_posted_day(
        &self,
        filter: &CohortFilter,
    ) -> Result<Vec<(NaiveDate, i64)>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT substr(v.posted_at, 1, 10) AS posted_day, COALESCE(SUM(v.views), 0) AS views
            FROM videos v WHERE v.posted_at IS NOT NULL
            "#,
        );
        push_cohort_filters(&mut query, filter);
        query.push(" GROUP BY posted_day ORDER BY posted_day");

        let rows = query
            .build_query_as::<(String, i64)>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(day, views)| {
                NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .ok()
                    .map(|day| (day, views))
            })
            .collect())
    }

    /// Snapshot rows in `[start, end]` for the cohort, summed per day
    pub async fn daily_growth(
        &self,
        filter: &CohortFilter,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyGrowthRow>, AppError> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                h.snapshot_date AS snapshot_date,
                COALESCE(SUM(h.views), 0) AS views,
                COALESCE(SUM(h.views_growth), 0) AS views_growth,
                COALESCE(SUM(h.likes), 0) AS likes,
                COALESCE(SUM(h.likes_growth), 0) AS likes_growth,
                COALESCE(SUM(h.comments), 0) AS comments,
                COALESCE(SUM(h.comments_growth), 0) AS comments_growth,
                COALESCE(SUM(h.shares), 0) AS shares,
                COALESCE(SUM(h.saves), 0) AS saves
            FROM video_history h
            JOIN videos v ON v.id = h.video_id AND v.platform = h.platform
            WHERE h.snapshot_date >=
            "#,
        );
        query
            .push_bind(start)
            .push(" AND h.snapshot_date <= ")
            .push_bind(end);
        push_cohort_filters(&mut query, filter);
        query.push(" GROUP BY h.snapshot_date ORDER BY h.snapshot_date");

        let rows = query
            .build_query_as::<DailyGrowthRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // =========================================================================
    // Ingest jobs
    // =========================================================================

    /// Insert or replace the full job row
    pub async fn save_job(&self, job: &IngestJob) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO ingest_jobs (
                id, status, targets, total, processed, videos_upserted,
                error_count, errors, created_at, started_at, finished_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                processed = excluded.processed,
                videos_upserted = excluded.videos_upserted,
                error_count = excluded.error_count,
                errors = excluded.errors,
                started_at = excluded.started_at,
                finished_at = excluded.finished_at
            "#,
        )
        .bind(&job.id)
        .bind(job.status)
        .bind(&job.targets)
        .bind(job.total)
        .bind(job.processed)
        .bind(job.videos_upserted)
        .bind(job.error_count)
        .bind(&job.errors)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.finished_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_job(&self, id: &str) -> Result<Option<IngestJob>, AppError> {
        let job = sqlx::query_as::<_, IngestJob>("SELECT * FROM ingest_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    pub async fn list_jobs(&self, limit: i64) -> Result<Vec<IngestJob>, AppError> {
        let jobs = sqlx::query_as::<_, IngestJob>(
            "SELECT * FROM ingest_jobs ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Fail jobs left pending or running by a previous process.
    pub async fn fail_interrupted_jobs(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE ingest_jobs
            SET status = 'failed', finished_at = ?
            WHERE status IN ('pending', 'running')
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
