//! Expired-hold sweeper and release worker
//!
//! The sweeper enumerates expired active holds once a minute (plus a
//! catch-up pass at startup for holds that expired while the process was
//! down) and dispatches uniquely-keyed release jobs. The Redis job marker
//! collapses duplicate dispatches across sweeps and replicas; the worker
//! performs the actual release with bounded retries.

use std::time::Duration;

use chrono::Utc;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::db;
use crate::error::ServiceResult;
use crate::holds::HoldManager;

/// Sweep cadence
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound per sweep so one backlog cannot monopolize a cycle
const SWEEP_BATCH: i64 = 500;

/// Job marker TTL; a crashed worker frees the key for redelivery
const JOB_KEY_TTL_SECS: u64 = 30;

/// Release attempts per job
const JOB_TRIES: u32 = 3;
const JOB_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Unique job key: duplicate dispatches for the same hold collapse
fn job_key(hold_id: i64) -> String {
    format!("release_hold_{hold_id}")
}

/// Periodic scan for expired active holds
pub struct ExpirySweeper {
    pool: PgPool,
    redis: ConnectionManager,
    jobs: mpsc::Sender<i64>,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(
        pool: PgPool,
        redis: ConnectionManager,
        jobs: mpsc::Sender<i64>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            redis,
            jobs,
            shutdown,
        }
    }

    /// Main loop: startup catch-up pass, then once per minute
    pub async fn run(self) {
        tracing::info!("Expiry sweeper started");

        self.sweep().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(SWEEP_INTERVAL) => self.sweep().await,
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }
    }

    /// One sweep pass: enumerate expired active holds and dispatch uniquely
    /// keyed release jobs
    pub async fn sweep(&self) {
        let expired = match db::holds::list_expired_active(&self.pool, Utc::now(), SWEEP_BATCH).await
        {
            Ok(holds) => holds,
            Err(e) => {
                tracing::error!(error = %e, "Failed to enumerate expired holds");
                return;
            }
        };

        if expired.is_empty() {
            tracing::debug!("No expired holds this sweep");
            return;
        }
        tracing::info!(count = expired.len(), "Dispatching release jobs for expired holds");

        for hold in expired {
            match self.claim_job(hold.id).await {
                Ok(true) => {
                    if self.jobs.send(hold.id).await.is_err() {
                        tracing::warn!("Release job channel closed, stopping dispatch");
                        return;
                    }
                }
                Ok(false) => {
                    // Another sweep (or replica) already dispatched this hold
                }
                Err(e) => {
                    tracing::warn!(hold_id = hold.id, error = %e, "Failed to claim release job");
                }
            }
        }
    }

    async fn claim_job(&self, hold_id: i64) -> ServiceResult<bool> {
        let mut conn = self.redis.clone();
        let claimed: bool = redis::cmd("SET")
            .arg(job_key(hold_id))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(JOB_KEY_TTL_SECS)
            .query_async(&mut conn)
            .await?;
        Ok(claimed)
    }
}

/// Consumes release jobs and invokes the hold manager with bounded retries
pub struct ReleaseWorker {
    holds: HoldManager,
    shutdown: CancellationToken,
}

impl ReleaseWorker {
    pub fn new(holds: HoldManager, shutdown: CancellationToken) -> Self {
        Self { holds, shutdown }
    }

    pub async fn run(self, mut jobs: mpsc::Receiver<i64>) {
        tracing::info!("Release worker started");

        loop {
            tokio::select! {
                job = jobs.recv() => match job {
                    Some(hold_id) => self.process(hold_id).await,
                    None => {
                        tracing::info!("Release job channel closed, worker stopping");
                        return;
                    }
                },
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Release worker received shutdown signal");
                    return;
                }
            }
        }
    }

    async fn process(&self, hold_id: i64) {
        for attempt in 1..=JOB_TRIES {
            match self.holds.release_hold(hold_id).await {
                Ok(true) => {
                    tracing::info!(hold_id, "Expired hold released");
                    return;
                }
                Ok(false) => {
                    // Used or already released since the sweep enumerated it
                    tracing::debug!(hold_id, "Expired hold no longer releasable");
                    return;
                }
                Err(e) => {
                    tracing::warn!(hold_id, attempt, error = %e, "Release job attempt failed");
                    if attempt < JOB_TRIES {
                        tokio::time::sleep(JOB_RETRY_DELAY).await;
                    }
                }
            }
        }
        tracing::error!(hold_id, tries = JOB_TRIES, "Giving up on release job");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key_format() {
        assert_eq!(job_key(42), "release_hold_42");
    }

    #[test]
    fn test_sweep_cadence_is_one_minute() {
        assert_eq!(SWEEP_INTERVAL, Duration::from_secs(60));
        assert_eq!(JOB_TRIES, 3);
        assert_eq!(JOB_KEY_TTL_SECS, 30);
    }
}
