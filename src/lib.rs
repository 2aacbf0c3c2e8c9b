//! ReelTrack - short-form video performance tracking
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Videos, accounts, collections                            │
//! │  - Analytics queries                                        │
//! │  - Ingestion, jobs, admin                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Ingestion and account aggregation                        │
//! │  - Snapshot engine, analytics                               │
//! │  - Orchestrator, background jobs, scheduler                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Scrape collaborator gateway (reqwest)                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `scheduler`: Daily cycle loop
//! - `scraper`: Scrape collaborator boundary
//! - `data`: Database layer
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod scraper;
pub mod service;

use std::sync::Arc;

const MAX_REQUEST_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across all handlers
///
/// This struct is cloned for each request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    pub ingest: Arc<service::IngestService>,
    pub accounts: Arc<service::AccountService>,
    pub collections: Arc<service::CollectionService>,
    pub snapshots: service::SnapshotService,
    pub analytics: Arc<service::AnalyticsService>,

    /// Daily cycle and single-target ingestion
    pub orchestrator: service::Orchestrator,

    /// Ad-hoc ingest jobs
    pub jobs: service::JobService,
}

impl AppState {
    /// Initialize application state with the configured scrape collaborator
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let scraper = scraper::from_config(&config.scraper)?;
        Self::with_scraper(config, scraper).await
    }

    /// Initialize application state around an explicit scrape collaborator
    ///
    /// # Steps
    /// 1. Connect to SQLite database
    /// 2. Build services
    /// 3. Ensure the Default collection
    /// 4. Fail jobs interrupted by a previous run
    pub async fn with_scraper(
        config: config::AppConfig,
        scraper: Arc<dyn scraper::ScraperSource>,
    ) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Build services
        let ingest = Arc::new(service::IngestService::new(db.clone()));
        let accounts = Arc::new(service::AccountService::new(db.clone()));
        let collections = Arc::new(service::CollectionService::new(db.clone()));
        let snapshots = service::SnapshotService::new(db.clone(), config.snapshot.max_concurrent);
        let analytics = Arc::new(service::AnalyticsService::new(db.clone()));
        let orchestrator = service::Orchestrator::new(
            db.clone(),
            ingest.clone(),
            snapshots.clone(),
            collections.clone(),
            scraper,
            config.scraper.profile_limit,
            config.scheduler.max_concurrent_accounts,
        );
        let jobs = service::JobService::new(db.clone(), orchestrator.clone());

        // 3. Ensure the Default collection
        collections.ensure_default().await?;

        // 4. Fail jobs interrupted by a previous run
        jobs.recover().await?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db,
            ingest,
            accounts,
            collections,
            snapshots,
            analytics,
            orchestrator,
            jobs,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::{Router, extract::DefaultBodyLimit};
    use tower_http::{
        compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
    };

    let cors_layer = build_cors_layer(&state.config.server);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        // Ingest batches can exceed axum's default JSON limit.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

fn build_cors_layer(server: &config::ServerConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    if server.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(%error, %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> &'static str {
    "OK"
}
