use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use querydesk_core::exec::QueryExecutor;

use crate::clock::Clock;
use crate::dispatcher::JobRunner;
use crate::notify::Notifier;
use crate::recurrence::advance;
use crate::store::JobStore;
use crate::types::{FailureCause, Frequency, JobStatus, ScheduledJob};

/// Executes one due occurrence of a job: `idle -> running -> success|error`.
///
/// Entry marks the job running (with `last_run`) before the query starts;
/// each attempt races the store call against the job's `timeout_secs`; the
/// exit records the outcome and, for recurring jobs, the advanced
/// `next_run`, which is also returned so the dispatcher can re-arm.
pub struct ExecutionRunner {
    store: Arc<JobStore>,
    executor: Arc<dyn QueryExecutor>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl ExecutionRunner {
    pub fn new(
        store: Arc<JobStore>,
        executor: Arc<dyn QueryExecutor>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            executor,
            notifier,
            clock,
        }
    }

    /// One bounded attempt. The losing side of the timeout race is
    /// abandoned, not awaited — the store may not support cancellation, so
    /// the executor is expected to bound its own in-flight backlog.
    async fn attempt(&self, job: &ScheduledJob) -> Option<FailureCause> {
        let bound = Duration::from_secs(u64::from(job.timeout_secs));
        match tokio::time::timeout(bound, self.executor.execute(&job.query)).await {
            Ok(Ok(outcome)) => {
                // Result rows are discarded: only the outcome feeds the schedule.
                debug!(job_id = %job.id, rows = outcome.rows.len(), "scheduled query succeeded");
                None
            }
            Ok(Err(e)) => Some(FailureCause::Query(e.to_string())),
            Err(_) => Some(FailureCause::Timeout {
                secs: job.timeout_secs,
            }),
        }
    }
}

#[async_trait]
impl JobRunner for ExecutionRunner {
    async fn run_job(&self, job_id: &str) -> Option<DateTime<Utc>> {
        let job = match self.store.get(job_id) {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %job_id, "due job could not be loaded: {e}");
                return None;
            }
        };

        let started = self.clock.now();
        if let Err(e) = self.store.mark_running(&job.id, started) {
            error!(job_id = %job.id, "could not mark job running: {e}");
            return None;
        }
        info!(job_id = %job.id, name = %job.name, "executing scheduled query");

        // Retries happen inside this occurrence and never move the schedule.
        let attempts = job.retry_count + 1;
        let mut failure = None;
        for attempt in 1..=attempts {
            failure = self.attempt(&job).await;
            match &failure {
                None => break,
                Some(cause) if attempt < attempts => {
                    warn!(job_id = %job.id, attempt, %cause, "attempt failed, retrying");
                }
                Some(_) => {}
            }
        }

        let status = if failure.is_none() {
            JobStatus::Success
        } else {
            JobStatus::Error
        };
        // Advance from the previous scheduled slot, not the fire time, so a
        // late run does not push every later occurrence back.
        let next_run = match job.frequency {
            Frequency::Once => None,
            recurring => advance(recurring, job.next_run.unwrap_or(job.start_time)),
        };

        if let Err(e) = self
            .store
            .record_outcome(&job.id, status, next_run, self.clock.now())
        {
            // Without a persisted next_run the schedule is broken for this
            // job; make that loud and leave it disarmed rather than firing
            // off a state the store never saw.
            error!(job_id = %job.id, "run outcome could not be persisted; job will not be re-armed: {e}");
            return None;
        }

        if let Some(cause) = failure {
            warn!(job_id = %job.id, name = %job.name, %cause, "scheduled query failed");
            if job.notify_on_failure {
                if let Err(e) = self.notifier.notify(&job.id, &cause).await {
                    warn!(job_id = %job.id, "failure notification not delivered: {e}");
                }
            }
        }

        next_run
    }
}
