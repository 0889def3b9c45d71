// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Describes one scheduled job for logging/bookkeeping purposes; the actual
/// work runs in the closure handed to [`SchedulerHandle::add_job`].
#[derive(Debug, Clone)]
pub struct PollJob {
    pub label: String,
    pub cron_expr: String,
    pub misfire_grace: Duration,
}

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Wraps `tokio-cron-scheduler`'s `JobScheduler`, adding the
/// `max_instances=1` / `coalesce=false` enforcement each job needs plus a
/// cancellation-token-driven graceful shutdown that waits for in-flight
/// firings to finish rather than aborting them mid-poll.
pub struct SchedulerHandle {
    scheduler: JobScheduler,
    cancel: CancellationToken,
}

/// Canonical cron expressions for the four fixed aggregation jobs, offset a
/// few seconds past their window boundary so the staging/rollup pass always
/// sees the bucket's final writes (ported from `original_source/main.py`'s
/// APScheduler `cron` trigger kwargs).
pub mod cron {
    pub const TWO_MINUTE_STAGING: &str = "0 */2 * * * *";
    pub const TEN_MINUTE_ROLLUP: &str = "5 */10 * * * *";
    pub const HOURLY_ROLLUP: &str = "10 0 * * * *";
    pub const DAILY_ROLLUP: &str = "0 5 0 * * *";
}

impl SchedulerHandle {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new().await.map_err(|e| anyhow!("failed to start job scheduler: {e}"))?;
        Ok(Self { scheduler, cancel: CancellationToken::new() })
    }

    /// Registers a cron job. `max_instances=1`: if a previous firing of this
    /// job is still running when the next one is due, the new firing is
    /// skipped and logged rather than queued (`coalesce=false` in the
    /// original APScheduler config). `misfire_grace` bounds how long a
    /// single firing may run before a warning is logged; it does not cancel
    /// the job in flight.
    pub async fn add_job<F, Fut>(&mut self, spec: PollJob, mut task: F) -> Result<Uuid>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(false));
        let label = spec.label.clone();
        let misfire_grace = spec.misfire_grace;
        let cancel = self.cancel.clone();

        let job = Job::new_async(spec.cron_expr.as_str(), move |_uuid, _lock| -> BoxFuture {
            if cancel.is_cancelled() {
                return Box::pin(async {});
            }
            if running.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
                warn!(job = %label, "skipped: previous run still in progress (max_instances=1)");
                return Box::pin(async {});
            }

            let running = Arc::clone(&running);
            let label = label.clone();
            let fut = task();
            Box::pin(async move {
                let started = tokio::time::Instant::now();
                fut.await;
                let elapsed = started.elapsed();
                if elapsed > misfire_grace {
                    warn!(job = %label, ?elapsed, ?misfire_grace, "run exceeded misfire grace period");
                }
                running.store(false, Ordering::SeqCst);
            })
        })
        .map_err(|e| anyhow!("failed to build job {}: {e}", spec.label))?;

        let uuid = self.scheduler.add(job).await.map_err(|e| anyhow!("failed to register job {}: {e}", spec.label))?;
        info!(job = %spec.label, cron = %spec.cron_expr, "job registered");
        Ok(uuid)
    }

    pub async fn start(&mut self) -> Result<()> {
        self.scheduler.start().await.map_err(|e| anyhow!("failed to start scheduler: {e}"))
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Signals every job to stop claiming new work, then waits up to
    /// `max_wait` for the scheduler's internal shutdown to complete.
    pub async fn shutdown(mut self, max_wait: Duration) -> Result<()> {
        self.cancel.cancel();
        match tokio::time::timeout(max_wait, self.scheduler.shutdown()).await {
            Ok(res) => res.map_err(|e| anyhow!("scheduler shutdown error: {e}")),
            Err(_) => {
                warn!(?max_wait, "scheduler shutdown did not complete in time, proceeding anyway");
                Ok(())
            }
        }
    }
}
