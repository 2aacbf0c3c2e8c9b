//! Daily cycle scheduler
//!
//! Runs the orchestrator once a day at a fixed UTC time. The loop is owned
//! by a [`SchedulerHandle`]; stopping it cancels the wait and awaits the task.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::service::{CycleTrigger, Orchestrator};

async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => true,
        _ = sleep(duration) => false,
    }
}

/// Time left until the next `hour:minute` UTC strictly after `now`.
pub fn duration_until_next_run(now: DateTime<Utc>, hour: u32, minute: u32) -> Duration {
    let run_at = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date_naive().and_time(run_at).and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}

pub struct Scheduler;

impl Scheduler {
    /// Spawn the daily loop.
    pub fn start(orchestrator: Orchestrator, config: SchedulerConfig) -> SchedulerHandle {
        let token = CancellationToken::new();
        let loop_token = token.clone();

        let task = tokio::spawn(async move {
            tracing::info!(
                hour = config.run_at_hour,
                minute = config.run_at_minute,
                "Daily cycle scheduler started"
            );

            loop {
                let wait = duration_until_next_run(Utc::now(), config.run_at_hour, config.run_at_minute);
                tracing::debug!(wait_secs = wait.as_secs(), "Waiting for next daily cycle");

                if sleep_or_cancel(&loop_token, wait).await {
                    tracing::info!("Daily cycle scheduler stopped (shutdown)");
                    return;
                }

                let today = Utc::now().date_naive();
                tokio::select! {
                    _ = loop_token.cancelled() => {
                        tracing::warn!("Daily cycle interrupted by shutdown");
                        return;
                    }
                    result = orchestrator.run_daily_cycle(today, CycleTrigger::Scheduled) => {
                        if let Err(error) = result {
                            tracing::error!(%error, "Daily cycle failed");
                        }
                    }
                }
            }
        });

        SchedulerHandle { token, task }
    }
}

/// Owner of a running scheduler loop
pub struct SchedulerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(error) = self.task.await {
            tracing::error!(%error, "Scheduler task panicked");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
