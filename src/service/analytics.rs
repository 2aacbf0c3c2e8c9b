//! Analytics service
//!
//! Read-only aggregations over the video store and snapshot history.
//! Every time series is dense over its window and every aggregation
//! returns a zero-valued shape for an empty cohort.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::data::{CohortFilter, DailyGrowthRow, Database, Platform, Video};
use crate::error::AppError;
use crate::metrics::ANALYTICS_QUERIES_TOTAL;

pub const MAX_WINDOW_DAYS: u32 = 365;
/// Window used when `days` is omitted
pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Snapshot growth series look further back by default
pub const DEFAULT_GROWTH_WINDOW_DAYS: u32 = 30;

/// Paid-promotion split of the cohort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    #[default]
    Total,
    Organic,
    Ads,
}

impl MetricType {
    fn spark_ad_filter(&self) -> Option<bool> {
        match self {
            Self::Total => None,
            Self::Organic => Some(false),
            Self::Ads => Some(true),
        }
    }
}

impl std::str::FromStr for MetricType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(Self::Total),
            "organic" => Ok(Self::Organic),
            "ads" => Ok(Self::Ads),
            other => Err(AppError::Validation(format!(
                "metric_type must be total, organic or ads: {}",
                other
            ))),
        }
    }
}

/// Common filter accepted by every analytics query
#[derive(Debug, Clone)]
pub struct AnalyticsFilter {
    pub days: u32,
    pub metric_type: MetricType,
    pub platforms: Vec<Platform>,
    pub collection_id: Option<String>,
}

impl AnalyticsFilter {
    /// Parse raw query values. `platforms` is a comma separated list.
    pub fn parse(
        days: Option<u32>,
        metric_type: Option<&str>,
        platforms: Option<&str>,
        collection_id: Option<String>,
    ) -> Result<Self, AppError> {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        if !(1..=MAX_WINDOW_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }

        let metric_type = match metric_type {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => MetricType::Total,
        };

        let mut parsed_platforms = Vec::new();
        for raw in platforms.unwrap_or_default().split(',') {
            if raw.trim().is_empty() {
                continue;
            }
            let platform: Platform = raw.parse()?;
            if !parsed_platforms.contains(&platform) {
                parsed_platforms.push(platform);
            }
        }

        Ok(Self {
            days,
            metric_type,
            platforms: parsed_platforms,
            collection_id: collection_id.filter(|id| !id.trim().is_empty()),
        })
    }
}

// =============================================================================
// Response shapes
// =============================================================================

/// Cumulative totals over the whole filtered cohort
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub engagement: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewsPoint {
    pub date: NaiveDate,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub views: i64,
    pub views_growth: i64,
    pub likes: i64,
    pub likes_growth: i64,
    pub comments: i64,
    pub comments_growth: i64,
    pub shares: i64,
    pub saves: i64,
    pub engagement: i64,
}

impl GrowthPoint {
    fn empty(date: NaiveDate) -> Self {
        Self::from_row(DailyGrowthRow {
            snapshot_date: date,
            ..Default::default()
        })
    }

    fn from_row(row: DailyGrowthRow) -> Self {
        Self {
            date: row.snapshot_date,
            views: row.views,
            views_growth: row.views_growth,
            likes: row.likes,
            likes_growth: row.likes_growth,
            comments: row.comments,
            comments_growth: row.comments_growth,
            shares: row.shares,
            saves: row.saves,
            engagement: row.likes + row.comments + row.shares + row.saves,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GrowthSplit {
    pub organic: Vec<GrowthPoint>,
    pub spark_ads: Vec<GrowthPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViralityBucket {
    pub range: &'static str,
    pub video_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViralityBreakdown {
    pub median_views: i64,
    pub buckets: Vec<ViralityBucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationBucket {
    pub range: &'static str,
    pub average_views: i64,
    pub video_count: i64,
}

/// A video ranked against its cohort
#[derive(Debug, Clone, Serialize)]
pub struct VideoPerformance {
    pub id: String,
    pub platform: Platform,
    pub url: String,
    pub thumbnail: Option<String>,
    pub caption: Option<String>,
    pub author_username: Option<String>,
    pub posted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration: Option<i64>,
    pub is_spark_ad: bool,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub saves: i64,
    pub multiplier: f64,
    pub engagement_rate: f64,
    pub performance_indicator: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoStatsPage {
    pub items: Vec<VideoPerformance>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
    pub average_views: f64,
}

/// Per-video averages over a posted window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricAverages {
    pub video_count: i64,
    pub avg_views: i64,
    pub avg_likes: i64,
    pub avg_comments: i64,
}

/// Averages for videos posted today and over the last seven days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsBreakdown {
    pub daily: MetricAverages,
    pub weekly: MetricAverages,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformCounts {
    pub tiktok: i64,
    pub instagram: i64,
    pub youtube: i64,
}

/// Store-wide tracking counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackingStats {
    pub total_videos: i64,
    pub videos_by_platform: PlatformCounts,
    pub active_accounts: i64,
}

// =============================================================================
// Pure aggregation helpers
// =============================================================================

/// Inclusive window of `days` calendar days ending at `today`
pub fn window_bounds(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
    let days = days.max(1);
    (today - Duration::days(i64::from(days) - 1), today)
}

fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Running total of views by posted day, one entry per day in `[start, end]`.
pub fn cumulative_views(
    start: NaiveDate,
    end: NaiveDate,
    views_by_day: &[(NaiveDate, i64)],
) -> Vec<ViewsPoint> {
    let by_day: HashMap<NaiveDate, i64> = views_by_day.iter().copied().collect();
    let mut running = 0;
    dates_between(start, end)
        .map(|date| {
            running += by_day.get(&date).copied().unwrap_or(0);
            ViewsPoint {
                date,
                views: running,
            }
        })
        .collect()
}

/// Dense daily series with explicit zero rows for days without snapshots.
pub fn fill_growth(start: NaiveDate, end: NaiveDate, rows: Vec<DailyGrowthRow>) -> Vec<GrowthPoint> {
    let mut by_day: HashMap<NaiveDate, DailyGrowthRow> =
        rows.into_iter().map(|row| (row.snapshot_date, row)).collect();
    dates_between(start, end)
        .map(|date| match by_day.remove(&date) {
            Some(row) => GrowthPoint::from_row(row),
            None => GrowthPoint::empty(date),
        })
        .collect()
}

/// Upper median: element at `len / 2` of the sorted values
pub fn upper_median(values: &[i64]) -> i64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

const VIRALITY_BANDS: [(&str, f64); 7] = [
    ("below_1x", 1.0),
    ("1x_to_5x", 5.0),
    ("5x_to_10x", 10.0),
    ("10x_to_25x", 25.0),
    ("25x_to_50x", 50.0),
    ("50x_to_100x", 100.0),
    ("above_100x", f64::INFINITY),
];

/// Count videos by their views relative to the cohort median.
pub fn virality_breakdown(views: &[i64]) -> ViralityBreakdown {
    let median = upper_median(views);
    let mut counts = [0i64; VIRALITY_BANDS.len()];

    if median > 0 {
        for &v in views {
            let ratio = v as f64 / median as f64;
            let band = VIRALITY_BANDS
                .iter()
                .position(|(_, upper)| ratio < *upper)
                .unwrap_or(VIRALITY_BANDS.len() - 1);
            counts[band] += 1;
        }
    }

    ViralityBreakdown {
        median_views: median,
        buckets: VIRALITY_BANDS
            .iter()
            .zip(counts)
            .map(|(&(range, _), video_count)| ViralityBucket { range, video_count })
            .collect(),
    }
}

const DURATION_BANDS: [(&str, i64, i64); 7] = [
    ("0-5", 0, 5),
    ("5-10", 5, 10),
    ("10-20", 10, 20),
    ("20-30", 20, 30),
    ("30-45", 30, 45),
    ("45-60", 45, 60),
    ("60+", 60, i64::MAX),
];

/// Average views per duration band; empty bands are omitted.
///
/// Input is `(duration_seconds, views)` pairs.
pub fn duration_breakdown(samples: &[(i64, i64)]) -> Vec<DurationBucket> {
    DURATION_BANDS
        .iter()
        .filter_map(|&(range, low, high)| {
            let (count, total) = samples
                .iter()
                .filter(|(duration, _)| *duration >= low && *duration < high)
                .fold((0i64, 0i64), |(count, total), (_, views)| (count + 1, total + views));
            (count > 0).then(|| DurationBucket {
                range,
                average_views: total / count,
                video_count: count,
            })
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rank a video against the mean views of its cohort.
pub fn video_performance(video: &Video, mean_views: f64) -> VideoPerformance {
    let multiplier = if mean_views > 0.0 {
        round_to(video.views as f64 / mean_views, 1)
    } else {
        1.0
    };
    let performance_indicator = if multiplier > 1.0 {
        format!("{:.1}x more than usual", multiplier)
    } else {
        "Below average".to_string()
    };

    VideoPerformance {
        id: video.id.clone(),
        platform: video.platform,
        url: video.url.clone(),
        thumbnail: video.thumbnail.clone(),
        caption: video.caption.clone(),
        author_username: video.author_username.clone(),
        posted_at: video.posted_at,
        duration: video.duration,
        is_spark_ad: video.is_spark_ad,
        views: video.views,
        likes: video.likes,
        comments: video.comments,
        shares: video.shares,
        saves: video.bookmarks,
        multiplier,
        engagement_rate: round_to(video.engagement_rate(), 2),
        performance_indicator,
    }
}

/// Truncated integer averages; all zero for an empty set.
pub fn metric_averages(videos: &[Video]) -> MetricAverages {
    let count = videos.len() as i64;
    if count == 0 {
        return MetricAverages::default();
    }
    let sum = |metric: fn(&Video) -> i64| videos.iter().map(metric).sum::<i64>();
    MetricAverages {
        video_count: count,
        avg_views: sum(|v| v.views) / count,
        avg_likes: sum(|v| v.likes) / count,
        avg_comments: sum(|v| v.comments) / count,
    }
}

fn mean_views(videos: &[Video]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    videos.iter().map(|v| v.views as f64).sum::<f64>() / videos.len() as f64
}

// =============================================================================
// Service
// =============================================================================

/// Analytics service
pub struct AnalyticsService {
    db: Arc<Database>,
}

impl AnalyticsService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Resolve the filter into a cohort. `dated` limits it to videos posted in the window.
    async fn cohort(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
        dated: bool,
    ) -> Result<CohortFilter, AppError> {
        ANALYTICS_QUERIES_TOTAL.inc();

        let usernames = match &filter.collection_id {
            Some(collection_id) => {
                if self.db.get_collection(collection_id).await?.is_none() {
                    return Err(AppError::NotFound);
                }
                Some(self.db.collection_usernames(collection_id).await?)
            }
            None => None,
        };

        let (start, end) = window_bounds(today, filter.days);
        Ok(CohortFilter {
            platforms: filter.platforms.clone(),
            usernames,
            is_spark_ad: filter.metric_type.spark_ad_filter(),
            posted_from: dated.then_some(start),
            posted_to: dated.then_some(end),
        })
    }

    pub async fn overview(&self, filter: &AnalyticsFilter, today: NaiveDate) -> Result<Overview, AppError> {
        let cohort = self.cohort(filter, today, false).await?;
        if cohort.is_empty_scope() {
            return Ok(Overview::default());
        }

        let totals = self.db.cohort_totals(&cohort).await?;
        Ok(Overview {
            views: totals.views,
            likes: totals.likes,
            comments: totals.comments,
            shares: totals.shares,
            saves: totals.saves,
            engagement: totals.engagement(),
        })
    }

    pub async fn views_over_time(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> Result<Vec<ViewsPoint>, AppError> {
        let cohort = self.cohort(filter, today, true).await?;
        let (start, end) = window_bounds(today, filter.days);

        let per_day = if cohort.is_empty_scope() {
            Vec::new()
        } else {
            self.db.cohort_views_by_posted_day(&cohort).await?
        };
        Ok(cumulative_views(start, end, &per_day))
    }

    /// True daily growth from snapshot history, one entry per day.
    pub async fn historical_growth(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> Result<Vec<GrowthPoint>, AppError> {
        let cohort = self.cohort(filter, today, false).await?;
        let (start, end) = window_bounds(today, filter.days);

        let rows = if cohort.is_empty_scope() {
            Vec::new()
        } else {
            self.db.daily_growth(&cohort, start, end).await?
        };
        Ok(fill_growth(start, end, rows))
    }

    /// Organic and paid growth series side by side; `metric_type` is ignored.
    pub async fn historical_growth_split(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> Result<GrowthSplit, AppError> {
        let organic = AnalyticsFilter {
            metric_type: MetricType::Organic,
            ..filter.clone()
        };
        let ads = AnalyticsFilter {
            metric_type: MetricType::Ads,
            ..filter.clone()
        };

        let (organic, spark_ads) = futures::future::try_join(
            self.historical_growth(&organic, today),
            self.historical_growth(&ads, today),
        )
        .await?;
        Ok(GrowthSplit { organic, spark_ads })
    }

    pub async fn virality(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> Result<ViralityBreakdown, AppError> {
        let videos = self.dated_videos(filter, today).await?;
        let views: Vec<i64> = videos.iter().map(|v| v.views).collect();
        Ok(virality_breakdown(&views))
    }

    pub async fn duration(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> Result<Vec<DurationBucket>, AppError> {
        let videos = self.dated_videos(filter, today).await?;
        let samples: Vec<(i64, i64)> = videos
            .iter()
            .filter_map(|v| v.duration.map(|d| (d, v.views)))
            .collect();
        Ok(duration_breakdown(&samples))
    }

    /// Cohort ordered by views with each video compared to the cohort mean.
    pub async fn video_stats(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<VideoStatsPage, AppError> {
        let videos = self.dated_videos(filter, today).await?;
        let mean = mean_views(&videos);
        let total = videos.len() as i64;

        let items = videos
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|video| video_performance(video, mean))
            .collect();

        Ok(VideoStatsPage {
            items,
            total,
            limit,
            offset,
            has_more: offset + limit < total,
            average_views: round_to(mean, 2),
        })
    }

    /// Top `limit` videos by engagement rate among the `2 * limit` most viewed.
    pub async fn most_viral(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
        limit: usize,
    ) -> Result<Vec<VideoPerformance>, AppError> {
        let videos = self.dated_videos(filter, today).await?;
        let mean = mean_views(&videos);

        let mut ranked: Vec<VideoPerformance> = videos
            .iter()
            .take(limit.saturating_mul(2))
            .filter(|v| v.views > 0)
            .map(|video| video_performance(video, mean))
            .collect();
        ranked.sort_by(|a, b| {
            b.engagement_rate
                .total_cmp(&a.engagement_rate)
                .then(b.views.cmp(&a.views))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Averages for today's and the last seven days' posts; `days` is ignored.
    pub async fn metrics_breakdown(
        &self,
        filter: &AnalyticsFilter,
        today: NaiveDate,
    ) -> Result<MetricsBreakdown, AppError> {
        let daily = AnalyticsFilter {
            days: 1,
            ..filter.clone()
        };
        let weekly = AnalyticsFilter {
            days: 7,
            ..filter.clone()
        };

        let (daily, weekly) = futures::future::try_join(
            self.dated_videos(&daily, today),
            self.dated_videos(&weekly, today),
        )
        .await?;
        Ok(MetricsBreakdown {
            daily: metric_averages(&daily),
            weekly: metric_averages(&weekly),
        })
    }

    pub async fn stats(&self) -> Result<TrackingStats, AppError> {
        ANALYTICS_QUERIES_TOTAL.inc();

        let mut stats = TrackingStats {
            active_accounts: self.db.count_active_accounts().await?,
            ..Default::default()
        };
        for (platform, count) in self.db.count_videos_by_platform().await? {
            stats.total_videos += count;
            match platform {
                Platform::Tiktok => stats.videos_by_platform.tiktok = count,
                Platform::Instagram => stats.videos_by_platform.instagram = count,
                Platform::Youtube => stats.videos_by_platform.youtube = count,
            }
        }
        Ok(stats)
    }

    async fn dated_videos(&self, filter: &AnalyticsFilter, today: NaiveDate) -> Result<Vec<Video>, AppError> {
        let cohort = self.cohort(filter, today, true).await?;
        if cohort.is_empty_scope() {
            return Ok(Vec::new());
        }
        self.db.cohort_videos(&cohort).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_covers_exactly_n_days() {
        let (start, end) = window_bounds(date(2025, 3, 10), 7);
        assert_eq!(start, date(2025, 3, 4));
        assert_eq!(end, date(2025, 3, 10));
        assert_eq!(dates_between(start, end).count(), 7);

        let (start, end) = window_bounds(date(2025, 3, 10), 1);
        assert_eq!(start, end);
    }

    #[test]
    fn cumulative_views_are_dense_and_running() {
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 5);
        let points = cumulative_views(start, end, &[(date(2025, 1, 2), 10), (date(2025, 1, 4), 5)]);

        assert_eq!(
            points.iter().map(|p| p.views).collect::<Vec<_>>(),
            vec![0, 10, 10, 15, 15]
        );
        assert_eq!(cumulative_views(start, end, &[]).len(), 5);
    }

    #[test]
    fn growth_fill_inserts_zero_days() {
        let start = date(2025, 1, 1);
        let end = date(2025, 1, 3);
        let rows = vec![DailyGrowthRow {
            snapshot_date: date(2025, 1, 2),
            views: 100,
            views_growth: 40,
            likes: 10,
            saves: 2,
            ..Default::default()
        }];

        let points = fill_growth(start, end, rows);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], GrowthPoint::empty(date(2025, 1, 1)));
        assert_eq!(points[1].views_growth, 40);
        assert_eq!(points[1].engagement, 12);
        assert_eq!(points[2].views, 0);
    }

    #[test]
    fn virality_uses_upper_median() {
        let breakdown = virality_breakdown(&[10, 10, 10, 100, 1000]);
        assert_eq!(breakdown.median_views, 10);

        let count = |range: &str| {
            breakdown
                .buckets
                .iter()
                .find(|b| b.range == range)
                .map(|b| b.video_count)
                .unwrap()
        };
        assert_eq!(count("1x_to_5x"), 3);
        assert_eq!(count("10x_to_25x"), 1);
        assert_eq!(count("above_100x"), 1);
        assert_eq!(count("below_1x"), 0);

        assert_eq!(upper_median(&[1, 2, 3, 4]), 3);
    }

    #[test]
    fn virality_with_zero_median_is_all_zero() {
        let breakdown = virality_breakdown(&[0, 0, 5]);
        assert_eq!(breakdown.median_views, 0);
        assert!(breakdown.buckets.iter().all(|b| b.video_count == 0));
        assert_eq!(breakdown.buckets.len(), 7);

        assert!(virality_breakdown(&[]).buckets.iter().all(|b| b.video_count == 0));
    }

    #[test]
    fn duration_bands_skip_empty_ranges() {
        let buckets = duration_breakdown(&[(3, 100), (4, 51), (15, 10), (60, 7), (600, 3)]);
        assert_eq!(
            buckets,
            vec![
                DurationBucket {
                    range: "0-5",
                    average_views: 75,
                    video_count: 2
                },
                DurationBucket {
                    range: "10-20",
                    average_views: 10,
                    video_count: 1
                },
                DurationBucket {
                    range: "60+",
                    average_views: 5,
                    video_count: 2
                },
            ]
        );
    }

    #[test]
    fn metric_averages_truncate_and_zero_fill() {
        assert_eq!(metric_averages(&[]), MetricAverages::default());

        let video = |views: i64, likes: i64, comments: i64| Video {
            views,
            likes,
            comments,
            ..Video::from_record(&Default::default(), Platform::Tiktok, chrono::Utc::now())
        };
        let averages = metric_averages(&[video(100, 7, 1), video(201, 4, 0)]);
        assert_eq!(
            averages,
            MetricAverages {
                video_count: 2,
                avg_views: 150,
                avg_likes: 5,
                avg_comments: 0,
            }
        );
    }

    #[test]
    fn filter_parsing_validates_inputs() {
        let filter =
            AnalyticsFilter::parse(Some(30), Some("ads"), Some("TikTok, instagram,tiktok"), None)
                .unwrap();
        assert_eq!(filter.metric_type, MetricType::Ads);
        assert_eq!(filter.platforms, vec![Platform::Tiktok, Platform::Instagram]);

        assert!(AnalyticsFilter::parse(Some(0), None, None, None).is_err());
        assert!(AnalyticsFilter::parse(Some(366), None, None, None).is_err());
        assert!(AnalyticsFilter::parse(None, Some("paid"), None, None).is_err());
        assert!(AnalyticsFilter::parse(None, None, Some("vine"), None).is_err());
        assert_eq!(AnalyticsFilter::parse(None, None, None, None).unwrap().days, 7);
    }
}
