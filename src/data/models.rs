//! Data models
//!
//! Rust structs representing database entities and the ingestion wire contract.
//! Generated IDs use ULID; timestamps use chrono in UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::Json;

use crate::error::AppError;

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Platform
// =============================================================================

/// Supported source platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Tiktok, Platform::Instagram, Platform::Youtube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiktok => "tiktok",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
        }
    }

    /// Canonical public profile URL for a creator on this platform
    pub fn profile_url(&self, username: &str) -> String {
        let username = username.trim().trim_start_matches('@');
        match self {
            Self::Tiktok => format!("https://www.tiktok.com/@{}", username),
            Self::Instagram => format!("https://www.instagram.com/{}/", username),
            Self::Youtube => format!("https://www.youtube.com/@{}", username),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Self::Tiktok),
            "instagram" => Ok(Self::Instagram),
            "youtube" => Ok(Self::Youtube),
            other => Err(AppError::Validation(format!("unknown platform: {}", other))),
        }
    }
}

// =============================================================================
// Video
// =============================================================================

/// Canonical video row, unique per (id, platform)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: String,
    pub platform: Platform,
    pub url: String,
    pub thumbnail: Option<String>,
    pub caption: Option<String>,
    pub author_username: Option<String>,
    pub author_nickname: Option<String>,
    pub author_avatar: Option<String>,
    pub author_id: Option<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub bookmarks: i64,
    pub is_spark_ad: bool,
    /// Length in seconds
    pub duration: Option<i64>,
    pub hashtags: Json<Vec<String>>,
    pub music_id: Option<String>,
    pub music_title: Option<String>,
    pub music_author: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Video {
    /// Build a brand-new row from a validated record.
    pub fn from_record(record: &VideoRecord, platform: Platform, now: DateTime<Utc>) -> Self {
        let base = Self {
            id: record.id.trim().to_string(),
            platform,
            url: String::new(),
            thumbnail: None,
            caption: None,
            author_username: None,
            author_nickname: None,
            author_avatar: None,
            author_id: None,
            views: 0,
            likes: 0,
            comments: 0,
            shares: 0,
            bookmarks: 0,
            is_spark_ad: false,
            duration: None,
            hashtags: Json(Vec::new()),
            music_id: None,
            music_title: None,
            music_author: None,
            posted_at: None,
            scraped_at: now,
            created_at: now,
        };
        merge_record(&base, record, now)
    }

    pub fn metrics(&self) -> MetricTotals {
        MetricTotals {
            views: self.views,
            likes: self.likes,
            comments: self.comments,
            shares: self.shares,
            saves: self.bookmarks,
        }
    }

    /// (likes + comments + shares) / views as a percentage
    pub fn engagement_rate(&self) -> f64 {
        if self.views <= 0 {
            return 0.0;
        }
        (self.likes + self.comments + self.shares) as f64 / self.views as f64 * 100.0
    }
}

/// Overwrite the mutable fields of `existing` with the values from `record`.
///
/// Only the fields listed here are ever copied. `id`, `platform` and
/// `created_at` always come from `existing`.
pub fn merge_record(existing: &Video, record: &VideoRecord, now: DateTime<Utc>) -> Video {
    Video {
        id: existing.id.clone(),
        platform: existing.platform,
        created_at: existing.created_at,

        url: record.url.clone(),
        thumbnail: record.thumbnail.clone(),
        caption: record.caption.clone(),
        author_username: normalize_username(record.author_username.as_deref()),
        author_nickname: record.author_nickname.clone(),
        author_avatar: record.author_avatar.clone(),
        author_id: record.author_id.clone(),
        views: record.views.max(0),
        likes: record.likes.max(0),
        comments: record.comments.max(0),
        shares: record.shares.max(0),
        bookmarks: record.bookmarks.max(0),
        is_spark_ad: record.is_spark_ad,
        duration: record.duration.map(|d| d.max(0)),
        hashtags: Json(record.hashtags.clone()),
        music_id: record.music_id.clone(),
        music_title: record.music_title.clone(),
        music_author: record.music_author.clone(),
        posted_at: record.posted_at,
        scraped_at: now,
    }
}

fn normalize_username(username: Option<&str>) -> Option<String> {
    username
        .map(|u| u.trim().trim_start_matches('@').to_string())
        .filter(|u| !u.is_empty())
}

/// Canonical ingestion record produced by scrape collaborators
///
/// An explicit `null` on a required or counted field reads as its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub author_username: Option<String>,
    #[serde(default)]
    pub author_nickname: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shares: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bookmarks: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_spark_ad: bool,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub music_id: Option<String>,
    #[serde(default)]
    pub music_title: Option<String>,
    #[serde(default)]
    pub music_author: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

/// Treat `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl VideoRecord {
    /// Check identity fields and return the record's platform.
    pub fn validate(&self) -> Result<Platform, AppError> {
        if self.id.trim().is_empty() {
            return Err(AppError::Validation("video id is required".to_string()));
        }
        self.platform
            .ok_or_else(|| AppError::Validation(format!("platform is required for video {}", self.id)))
    }
}

/// Filters for the paginated video listing
#[derive(Debug, Clone, Default)]
pub struct VideoListFilter {
    pub platform: Option<Platform>,
    pub creator: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub is_spark_ad: Option<bool>,
}

// =============================================================================
// Account (creator aggregate)
// =============================================================================

/// Creator aggregate, unique per (username, platform)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub platform: Platform,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub profile_url: String,
    pub total_videos: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub is_active: bool,
    pub first_tracked: DateTime<Utc>,
    pub last_scraped: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Distinct creator entry for filter dropdowns
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Creator {
    pub username: String,
    pub platform: Platform,
    pub nickname: Option<String>,
    pub total_videos: i64,
}

// =============================================================================
// Collection
// =============================================================================

pub const DEFAULT_COLLECTION_NAME: &str = "Default";
pub const DEFAULT_COLLECTION_DESCRIPTION: &str = "All tracked videos";
pub const DEFAULT_COLLECTION_COLOR: &str = "#8B5CF6";
pub const DEFAULT_COLLECTION_ICON: &str = "folder";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Collection with membership counts derived at read time
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CollectionSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub collection: Collection,
    pub video_count: i64,
    pub account_count: i64,
}

// =============================================================================
// Snapshot (video history)
// =============================================================================

/// Cumulative metrics at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTotals {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
}

impl MetricTotals {
    pub fn engagement(&self) -> i64 {
        self.likes + self.comments + self.shares + self.saves
    }
}

/// Day-over-day growth, never negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Growth {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

impl Growth {
    /// Growth from `previous` to `current`, clamped at zero per metric.
    ///
    /// Without a prior snapshot there is no baseline and growth is zero.
    pub fn between(current: &MetricTotals, previous: Option<&MetricTotals>) -> Self {
        match previous {
            Some(previous) => Self {
                views: (current.views - previous.views).max(0),
                likes: (current.likes - previous.likes).max(0),
                comments: (current.comments - previous.comments).max(0),
            },
            None => Self::default(),
        }
    }
}

/// One snapshot row per video per calendar day
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoSnapshot {
    pub id: i64,
    pub video_id: String,
    pub platform: Platform,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub views_growth: i64,
    pub likes_growth: i64,
    pub comments_growth: i64,
    pub snapshot_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl VideoSnapshot {
    pub fn metrics(&self) -> MetricTotals {
        MetricTotals {
            views: self.views,
            likes: self.likes,
            comments: self.comments,
            shares: self.shares,
            saves: self.saves,
        }
    }
}

/// Whether a capture created today's row or refreshed it in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOutcome {
    Created,
    Updated,
}

/// Per-day sums of snapshot rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyGrowthRow {
    pub snapshot_date: NaiveDate,
    pub views: i64,
    pub views_growth: i64,
    pub likes: i64,
    pub likes_growth: i64,
    pub comments: i64,
    pub comments_growth: i64,
    pub shares: i64,
    pub saves: i64,
}

// =============================================================================
// Analytics cohort
// =============================================================================

/// Video subset an aggregation runs over
#[derive(Debug, Clone, Default)]
pub struct CohortFilter {
    pub platforms: Vec<Platform>,
    /// `Some(empty)` selects nothing
    pub usernames: Option<Vec<String>>,
    pub is_spark_ad: Option<bool>,
    pub posted_from: Option<NaiveDate>,
    pub posted_to: Option<NaiveDate>,
}

impl CohortFilter {
    pub fn is_empty_scope(&self) -> bool {
        matches!(&self.usernames, Some(names) if names.is_empty())
    }
}

// =============================================================================
// Ingest jobs
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Persisted ad-hoc ingestion request
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngestJob {
    pub id: String,
    pub status: JobStatus,
    pub targets: Json<Vec<String>>,
    pub total: i64,
    pub processed: i64,
    pub videos_upserted: i64,
    pub error_count: i64,
    pub errors: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
