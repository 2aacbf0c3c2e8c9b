//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate the database, the scrape collaborator and the
//! snapshot engine.

mod account;
mod analytics;
mod collection;
mod ingest;
mod jobs;
mod orchestrator;
mod snapshot;

pub use account::AccountService;
pub use analytics::{
    AnalyticsFilter, AnalyticsService, DEFAULT_GROWTH_WINDOW_DAYS, DEFAULT_WINDOW_DAYS,
    DurationBucket, GrowthPoint, GrowthSplit, MetricAverages, MetricType, MetricsBreakdown,
    Overview, PlatformCounts, TrackingStats, VideoPerformance, VideoStatsPage, ViewsPoint,
    ViralityBreakdown, ViralityBucket,
};
pub use collection::{CollectionInput, CollectionService};
pub use ingest::{AppliedVideo, IngestReport, IngestService, RecordError};
pub use jobs::JobService;
pub use orchestrator::{AccountFailure, CycleReport, CycleTrigger, Orchestrator, TargetOutcome};
pub use snapshot::{SnapshotFailure, SnapshotReport, SnapshotService};
