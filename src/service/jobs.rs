//! Background ingest jobs
//!
//! Ad-hoc scrape requests run as spawned tasks. Progress is persisted after
//! every target so callers can poll, and each job can be cancelled.

use chrono::Utc;
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::data::{Database, EntityId, IngestJob, JobStatus};
use crate::error::AppError;
use crate::metrics::{JOBS_RUNNING, JOBS_TOTAL};
use crate::scraper::ScrapeTarget;
use crate::service::Orchestrator;

/// Job registry and runner
#[derive(Clone)]
pub struct JobService {
    db: Arc<Database>,
    orchestrator: Orchestrator,
    running: Arc<RwLock<HashMap<String, CancellationToken>>>,
}

impl JobService {
    pub fn new(db: Arc<Database>, orchestrator: Orchestrator) -> Self {
        Self {
            db,
            orchestrator,
            running: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Mark jobs orphaned by a previous process as failed.
    pub async fn recover(&self) -> Result<u64, AppError> {
        let failed = self.db.fail_interrupted_jobs().await?;
        if failed > 0 {
            tracing::warn!(jobs = failed, "Marked interrupted ingest jobs as failed");
        }
        Ok(failed)
    }

    /// Validate the targets, persist a job and start it in the background.
    ///
    /// Unparseable inputs are recorded as job errors; the request is only
    /// rejected when no input is usable.
    pub async fn submit(&self, urls: Vec<String>) -> Result<IngestJob, AppError> {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(AppError::Validation("urls cannot be empty".to_string()));
        }

        let mut targets = Vec::new();
        let mut errors = Vec::new();
        for input in &urls {
            match ScrapeTarget::parse(input) {
                Ok(target) => targets.push(target),
                Err(error) => errors.push(format!("{}: {}", input, error)),
            }
        }
        if targets.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }

        let job = IngestJob {
            id: EntityId::new().0,
            status: JobStatus::Pending,
            targets: Json(targets.iter().map(|t| t.url.clone()).collect()),
            total: targets.len() as i64,
            processed: 0,
            videos_upserted: 0,
            error_count: errors.len() as i64,
            errors: Json(errors),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        self.db.save_job(&job).await?;

        let token = CancellationToken::new();
        self.running
            .write()
            .await
            .insert(job.id.clone(), token.clone());

        let service = self.clone();
        let spawned = job.clone();
        tokio::spawn(async move {
            let job_id = spawned.id.clone();
            if let Err(error) = service.run(spawned, targets, token).await {
                tracing::error!(%job_id, %error, "Ingest job aborted");
            }
            service.running.write().await.remove(&job_id);
        });

        tracing::info!(job_id = %job.id, targets = job.total, "Ingest job submitted");
        Ok(job)
    }

    /// Drive a job to a final status. The running gauge and the final save
    /// are handled here on every path, including storage errors mid-run.
    async fn run(
        &self,
        mut job: IngestJob,
        targets: Vec<ScrapeTarget>,
        token: CancellationToken,
    ) -> Result<(), AppError> {
        JOBS_RUNNING.inc();

        let processed = self.process(&mut job, &targets, &token).await;
        if let Err(error) = &processed {
            job.status = JobStatus::Failed;
            job.errors.0.push(format!("job aborted: {}", error));
        }

        job.finished_at = Some(Utc::now());
        job.error_count = job.errors.0.len() as i64;
        let saved = self.db.save_job(&job).await;

        JOBS_RUNNING.dec();
        let label = match job.status {
            JobStatus::Cancelled => "cancelled",
            JobStatus::Failed => "failed",
            _ => "completed",
        };
        JOBS_TOTAL.with_label_values(&[label]).inc();
        tracing::info!(
            job_id = %job.id,
            status = label,
            processed = job.processed,
            videos = job.videos_upserted,
            errors = job.error_count,
            "Ingest job finished"
        );

        processed.and(saved)
    }

    /// Work through the targets, persisting progress after each one.
    async fn process(
        &self,
        job: &mut IngestJob,
        targets: &[ScrapeTarget],
        token: &CancellationToken,
    ) -> Result<(), AppError> {
        job.status = JobStatus::Running;
        job.started_at = Some(Utc::now());
        self.db.save_job(job).await?;

        let mut failed_targets = 0;
        for target in targets {
            let outcome = tokio::select! {
                _ = token.cancelled() => None,
                result = self.orchestrator.ingest_target(target) => Some(result),
            };

            match outcome {
                None => {
                    job.status = JobStatus::Cancelled;
                    return Ok(());
                }
                Some(Ok(outcome)) => {
                    job.videos_upserted += outcome.report.videos.len() as i64;
                    for error in outcome.report.errors {
                        job.errors.0.push(format!("{}: record {}: {}", target.url, error.index, error.error));
                    }
                }
                Some(Err(error)) => {
                    failed_targets += 1;
                    tracing::warn!(job_id = %job.id, url = %target.url, %error, "Target ingestion failed");
                    job.errors.0.push(format!("{}: {}", target.url, error));
                }
            }

            job.processed += 1;
            job.error_count = job.errors.0.len() as i64;
            self.db.save_job(job).await?;
        }

        job.status = if failed_targets == targets.len() {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<IngestJob, AppError> {
        self.db.get_job(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list(&self, limit: i64) -> Result<Vec<IngestJob>, AppError> {
        self.db.list_jobs(limit).await
    }

    /// Request cancellation; the job stops before its next target.
    ///
    /// # Errors
    /// `NotFound` for unknown ids, `Conflict` when the job already finished.
    pub async fn cancel(&self, id: &str) -> Result<IngestJob, AppError> {
        let job = self.get(id).await?;
        match self.running.read().await.get(id) {
            Some(token) => {
                token.cancel();
                tracing::info!(job_id = %id, "Ingest job cancellation requested");
                Ok(job)
            }
            None if job.status.is_finished() => Err(AppError::Conflict(format!(
                "job {} already finished",
                id
            ))),
            None => Ok(job),
        }
    }
}
