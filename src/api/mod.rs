//! API layer
//!
//! HTTP handlers for:
//! - Videos, accounts and collections
//! - Analytics
//! - Ingestion, jobs and admin triggers
//! - Metrics (Prometheus)

mod accounts;
mod analytics;
mod collections;
mod dto;
mod ingest;
pub mod metrics;
mod videos;

pub use dto::*;
pub use metrics::metrics_router;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::AppState;

/// Create the `/api` router
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Videos
        .route("/videos", get(videos::list_videos))
        .route("/videos/:platform/:id", get(videos::get_video))
        .route("/videos/:platform/:id/spark-ad", patch(videos::set_spark_ad))
        .route("/videos/:platform/:id/history", get(videos::video_history))
        // Analytics
        .route("/analytics/overview", get(analytics::overview))
        .route("/analytics/views-over-time", get(analytics::views_over_time))
        .route("/analytics/historical-growth", get(analytics::historical_growth))
        .route(
            "/analytics/historical-growth-split",
            get(analytics::historical_growth_split),
        )
        .route("/analytics/virality-analysis", get(analytics::virality_analysis))
        .route("/analytics/duration-analysis", get(analytics::duration_analysis))
        .route("/analytics/video-stats", get(analytics::video_stats))
        .route("/analytics/most-viral", get(analytics::most_viral))
        .route("/analytics/metrics-breakdown", get(analytics::metrics_breakdown))
        .route("/stats", get(analytics::stats))
        // Collections
        .route(
            "/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route(
            "/collections/:id",
            get(collections::get_collection)
                .put(collections::update_collection)
                .delete(collections::delete_collection),
        )
        .route("/collections/:id/videos", get(collections::collection_videos))
        .route(
            "/collections/:id/videos/:platform/:video_id",
            post(collections::add_video).delete(collections::remove_video),
        )
        .route("/collections/:id/accounts", get(collections::collection_accounts))
        .route(
            "/collections/:id/accounts/:account_id",
            post(collections::add_account).delete(collections::remove_account),
        )
        // Accounts
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/:id",
            get(accounts::get_account).delete(accounts::delete_account),
        )
        .route("/accounts/:id/videos", get(accounts::account_videos))
        .route("/accounts/:id/refresh", post(accounts::refresh_account))
        .route("/creators", get(accounts::list_creators))
        // Ingestion and jobs
        .route("/ingest/records", post(ingest::ingest_records))
        .route("/scrape/urls", post(ingest::scrape_urls))
        .route("/jobs", get(ingest::list_jobs))
        .route("/jobs/:id", get(ingest::get_job).delete(ingest::cancel_job))
        // Admin
        .route("/admin/daily-cycle", post(ingest::run_daily_cycle))
}
