//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Ingestion Metrics
    pub static ref RECORDS_INGESTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_records_ingested_total", "Total number of video records applied"),
        &["platform", "outcome"]
    ).expect("metric can be created");
    pub static ref INGEST_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_ingest_errors_total", "Total number of rejected or failed video records"),
        &["error_type"]
    ).expect("metric can be created");
    pub static ref SCRAPE_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_scrape_requests_total", "Total number of scrape collaborator calls"),
        &["platform", "status"]
    ).expect("metric can be created");

    // Snapshot Metrics
    pub static ref SNAPSHOTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_snapshots_total", "Total number of snapshot captures"),
        &["outcome"]
    ).expect("metric can be created");

    // Scheduler Metrics
    pub static ref DAILY_CYCLES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_daily_cycles_total", "Total number of daily cycles run"),
        &["trigger"]
    ).expect("metric can be created");
    pub static ref DAILY_CYCLE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "reeltrack_daily_cycle_duration_seconds",
            "Daily cycle duration in seconds"
        ).buckets(vec![1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["phase"]
    ).expect("metric can be created");

    // Job Metrics
    pub static ref JOBS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_jobs_total", "Total number of ingest jobs by final status"),
        &["status"]
    ).expect("metric can be created");
    pub static ref JOBS_RUNNING: IntGauge = IntGauge::new(
        "reeltrack_jobs_running",
        "Current number of running ingest jobs"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("reeltrack_errors_total", "Total number of HTTP error responses"),
        &["error_type"]
    ).expect("metric can be created");

    pub static ref ANALYTICS_QUERIES_TOTAL: IntCounter = IntCounter::new(
        "reeltrack_analytics_queries_total",
        "Total number of analytics aggregations served"
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; later registrations are ignored.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RECORDS_INGESTED_TOTAL.clone()),
        Box::new(INGEST_ERRORS_TOTAL.clone()),
        Box::new(SCRAPE_REQUESTS_TOTAL.clone()),
        Box::new(SNAPSHOTS_TOTAL.clone()),
        Box::new(DAILY_CYCLES_TOTAL.clone()),
        Box::new(DAILY_CYCLE_DURATION_SECONDS.clone()),
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOBS_RUNNING.clone()),
        Box::new(ERRORS_TOTAL.clone()),
        Box::new(ANALYTICS_QUERIES_TOTAL.clone()),
    ];

    for collector in collectors {
        if let Err(error) = REGISTRY.register(collector) {
            tracing::debug!(%error, "Metric already registered");
        }
    }

    tracing::info!("Metrics registry initialized");
}
