//! Analytics endpoints
//!
//! All queries share the `days`, `metric_type`, `platform` and
//! `collection_id` parameters. Windows end at the current UTC date.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{NaiveDate, Utc};

use super::dto::{AnalyticsParams, PaginationParams};
use crate::AppState;
use crate::error::AppError;
use crate::service::{
    AnalyticsFilter, DEFAULT_GROWTH_WINDOW_DAYS, DEFAULT_WINDOW_DAYS, DurationBucket, GrowthPoint,
    GrowthSplit, MetricsBreakdown, Overview, TrackingStats, VideoPerformance, VideoStatsPage,
    ViewsPoint, ViralityBreakdown,
};

const DEFAULT_MOST_VIRAL_LIMIT: i64 = 10;
const MAX_MOST_VIRAL_LIMIT: i64 = 100;

fn resolve(params: &AnalyticsParams) -> Result<(AnalyticsFilter, NaiveDate), AppError> {
    resolve_with_default(params, DEFAULT_WINDOW_DAYS)
}

fn resolve_with_default(
    params: &AnalyticsParams,
    default_days: u32,
) -> Result<(AnalyticsFilter, NaiveDate), AppError> {
    let filter = AnalyticsFilter::parse(
        Some(params.days.unwrap_or(default_days)),
        params.metric_type.as_deref(),
        params.platform.as_deref(),
        params.collection_id.clone(),
    )?;
    Ok((filter, Utc::now().date_naive()))
}

/// GET /api/analytics/overview
pub async fn overview(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<Overview>, AppError> {
    let (filter, today) = resolve(&params)?;
    Ok(Json(state.analytics.overview(&filter, today).await?))
}

/// GET /api/analytics/views-over-time
pub async fn views_over_time(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<Vec<ViewsPoint>>, AppError> {
    let (filter, today) = resolve(&params)?;
    Ok(Json(state.analytics.views_over_time(&filter, today).await?))
}

/// GET /api/analytics/historical-growth
pub async fn historical_growth(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<Vec<GrowthPoint>>, AppError> {
    let (filter, today) = resolve_with_default(&params, DEFAULT_GROWTH_WINDOW_DAYS)?;
    Ok(Json(state.analytics.historical_growth(&filter, today).await?))
}

/// GET /api/analytics/historical-growth-split
pub async fn historical_growth_split(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<GrowthSplit>, AppError> {
    let (filter, today) = resolve_with_default(&params, DEFAULT_GROWTH_WINDOW_DAYS)?;
    Ok(Json(
        state.analytics.historical_growth_split(&filter, today).await?,
    ))
}

/// GET /api/analytics/virality-analysis
pub async fn virality_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<ViralityBreakdown>, AppError> {
    let (filter, today) = resolve(&params)?;
    Ok(Json(state.analytics.virality(&filter, today).await?))
}

/// GET /api/analytics/duration-analysis
pub async fn duration_analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<Vec<DurationBucket>>, AppError> {
    let (filter, today) = resolve(&params)?;
    Ok(Json(state.analytics.duration(&filter, today).await?))
}

/// GET /api/analytics/video-stats
pub async fn video_stats(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<VideoStatsPage>, AppError> {
    let (filter, today) = resolve(&params)?;
    let (limit, offset) = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve()?;

    Ok(Json(
        state
            .analytics
            .video_stats(&filter, today, limit, offset)
            .await?,
    ))
}

/// GET /api/analytics/most-viral
pub async fn most_viral(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<Vec<VideoPerformance>>, AppError> {
    let (filter, today) = resolve(&params)?;
    let limit = params.limit.unwrap_or(DEFAULT_MOST_VIRAL_LIMIT);
    if !(1..=MAX_MOST_VIRAL_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {}",
            MAX_MOST_VIRAL_LIMIT
        )));
    }

    Ok(Json(
        state
            .analytics
            .most_viral(&filter, today, limit as usize)
            .await?,
    ))
}

/// GET /api/analytics/metrics-breakdown
pub async fn metrics_breakdown(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<MetricsBreakdown>, AppError> {
    let (filter, today) = resolve(&params)?;
    Ok(Json(state.analytics.metrics_breakdown(&filter, today).await?))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<TrackingStats>, AppError> {
    Ok(Json(state.analytics.stats().await?))
}
