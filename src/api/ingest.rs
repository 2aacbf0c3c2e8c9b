//! Ingestion, job and admin endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;

use super::dto::{CycleAcceptedResponse, JobListParams, ScrapeAcceptedResponse, ScrapeUrlsRequest};
use crate::AppState;
use crate::data::IngestJob;
use crate::error::AppError;
use crate::service::{CycleTrigger, IngestReport};

const DEFAULT_JOB_LIMIT: i64 = 20;
const MAX_INGEST_BATCH: usize = 1000;

/// POST /api/ingest/records
///
/// Push-style ingestion. Each item is validated on its own and the
/// batch report lists successes and failures together.
pub async fn ingest_records(
    State(state): State<AppState>,
    Json(items): Json<Vec<serde_json::Value>>,
) -> Result<Json<IngestReport>, AppError> {
    if items.len() > MAX_INGEST_BATCH {
        return Err(AppError::Validation(format!(
            "at most {} records per request",
            MAX_INGEST_BATCH
        )));
    }
    Ok(Json(state.ingest.apply_values(items).await))
}

/// POST /api/scrape/urls
pub async fn scrape_urls(
    State(state): State<AppState>,
    Json(req): Json<ScrapeUrlsRequest>,
) -> Result<(StatusCode, Json<ScrapeAcceptedResponse>), AppError> {
    let job = state.jobs.submit(req.urls).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ScrapeAcceptedResponse {
            job_id: job.id,
            status: "processing",
            urls: job.targets.0,
            rejected: job.errors.0,
        }),
    ))
}

/// GET /api/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListParams>,
) -> Result<Json<Vec<IngestJob>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_JOB_LIMIT).clamp(1, 200);
    Ok(Json(state.jobs.list(limit).await?))
}

/// GET /api/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IngestJob>, AppError> {
    Ok(Json(state.jobs.get(&id).await?))
}

/// DELETE /api/jobs/:id
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<IngestJob>), AppError> {
    let job = state.jobs.cancel(&id).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// POST /api/admin/daily-cycle
///
/// Starts the daily cycle in the background for the current UTC date.
pub async fn run_daily_cycle(
    State(state): State<AppState>,
) -> (StatusCode, Json<CycleAcceptedResponse>) {
    let today = Utc::now().date_naive();
    let orchestrator = state.orchestrator.clone();

    tokio::spawn(async move {
        if let Err(error) = orchestrator
            .run_daily_cycle(today, CycleTrigger::Manual)
            .await
        {
            tracing::error!(%error, "Manual daily cycle failed");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(CycleAcceptedResponse {
            status: "started",
            snapshot_date: today,
        }),
    )
}
