use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use querydesk_core::exec::QueryExecutor;

use crate::clock::Clock;
use crate::dispatcher::{Dispatcher, JobRunner};
use crate::error::{Result, SchedulerError};
use crate::notify::Notifier;
use crate::runner::ExecutionRunner;
use crate::store::JobStore;
use crate::types::{Frequency, JobSummary, JobStatus, ScheduledJob, DEFAULT_TIMEOUT_SECS};

/// A request to schedule a query. Optional knobs fall back to the same
/// defaults the UI offers: 300s timeout, no retries, notify on failure.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub name: String,
    pub description: Option<String>,
    pub query: String,
    pub frequency: Frequency,
    pub start_time: DateTime<Utc>,
    pub timeout_secs: Option<u32>,
    pub retry_count: Option<u32>,
    pub notify_on_failure: Option<bool>,
}

/// Front door of the scheduling subsystem: owns the store, the dispatcher
/// and the execution runner, and keeps the three consistent.
pub struct Scheduler {
    store: Arc<JobStore>,
    dispatcher: Dispatcher,
    runner: Arc<ExecutionRunner>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(
        store: Arc<JobStore>,
        executor: Arc<dyn QueryExecutor>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let dispatcher = Dispatcher::new(Arc::clone(&clock));
        let runner = Arc::new(ExecutionRunner::new(
            Arc::clone(&store),
            executor,
            notifier,
            Arc::clone(&clock),
        ));
        Self {
            store,
            dispatcher,
            runner,
            clock,
        }
    }

    /// Validate, persist and arm a new scheduled job. The first occurrence
    /// is the anchor itself: `next_run = start_time`, fired immediately if
    /// that instant has already passed.
    pub fn schedule_job(&self, request: ScheduleRequest) -> Result<ScheduledJob> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(SchedulerError::InvalidJob("name is required".into()));
        }
        if request.query.trim().is_empty() {
            return Err(SchedulerError::InvalidJob("query is required".into()));
        }
        let timeout_secs = request.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(SchedulerError::InvalidJob(
                "timeout_secs must be positive".into(),
            ));
        }

        let now = self.clock.now();
        let job = ScheduledJob {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: request.description,
            query: request.query,
            frequency: request.frequency,
            start_time: request.start_time,
            next_run: Some(request.start_time),
            last_run: None,
            timeout_secs,
            retry_count: request.retry_count.unwrap_or(0),
            notify_on_failure: request.notify_on_failure.unwrap_or(true),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store.create(&job)?;

        self.dispatcher.arm(
            Arc::clone(&self.runner) as Arc<dyn JobRunner>,
            &job.id,
            request.start_time,
        );
        info!(job_id = %job.id, name = %job.name, frequency = %job.frequency, "job scheduled");
        Ok(job)
    }

    /// Listing for the scheduling API, most recently created first.
    pub fn list_jobs(&self) -> Result<Vec<JobSummary>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(JobSummary::from)
            .collect())
    }

    /// Re-arm every job with a pending `next_run` after a restart. Jobs
    /// whose slot passed while the process was down fire immediately, once;
    /// terminal jobs (no `next_run`) stay quiet. Returns how many were
    /// armed.
    pub fn restore(&self) -> Result<usize> {
        let mut armed = 0;
        for job in self.store.list()? {
            if let Some(fire_at) = job.next_run {
                self.dispatcher.arm(
                    Arc::clone(&self.runner) as Arc<dyn JobRunner>,
                    &job.id,
                    fire_at,
                );
                armed += 1;
            }
        }
        info!(count = armed, "schedules restored");
        Ok(armed)
    }

    /// Cancel the pending trigger for a job. The row stays in the store;
    /// an in-flight run finishes on its own.
    pub fn disarm(&self, job_id: &str) {
        self.dispatcher.disarm(job_id);
    }

    /// Whether the dispatcher holds a pending trigger for the job.
    pub fn is_armed(&self, job_id: &str) -> bool {
        self.dispatcher.is_armed(job_id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use querydesk_core::exec::{QueryError, QueryOutcome};

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::db::init_db;
    use crate::notify::LogNotifier;

    struct OkExecutor;

    #[async_trait::async_trait]
    impl QueryExecutor for OkExecutor {
        async fn execute(&self, _sql: &str) -> std::result::Result<QueryOutcome, QueryError> {
            Ok(QueryOutcome::default())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn scheduler() -> Scheduler {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        Scheduler::new(
            Arc::new(JobStore::new(conn)),
            Arc::new(OkExecutor),
            Arc::new(LogNotifier),
            Arc::new(ManualClock::at(now())),
        )
    }

    fn request(name: &str) -> ScheduleRequest {
        ScheduleRequest {
            name: name.to_string(),
            description: None,
            query: "SELECT 1".to_string(),
            frequency: Frequency::Daily,
            start_time: now() + chrono::Duration::hours(1),
            timeout_secs: None,
            retry_count: None,
            notify_on_failure: None,
        }
    }

    #[tokio::test]
    async fn schedule_persists_and_arms() {
        let scheduler = scheduler();
        let job = scheduler.schedule_job(request("report")).unwrap();

        assert_eq!(job.next_run, Some(job.start_time));
        assert_eq!(job.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(job.retry_count, 0);
        assert!(job.notify_on_failure);
        assert!(scheduler.is_armed(&job.id));
    }

    #[tokio::test]
    async fn blank_name_is_invalid() {
        let scheduler = scheduler();
        let mut bad = request("  ");
        bad.name = "  ".to_string();
        let err = scheduler.schedule_job(bad).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidJob(_)));
    }

    #[tokio::test]
    async fn blank_query_is_invalid() {
        let scheduler = scheduler();
        let mut bad = request("no-query");
        bad.query = "\n".to_string();
        let err = scheduler.schedule_job(bad).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidJob(_)));
    }

    #[tokio::test]
    async fn zero_timeout_is_invalid() {
        let scheduler = scheduler();
        let mut bad = request("zero");
        bad.timeout_secs = Some(0);
        let err = scheduler.schedule_job(bad).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidJob(_)));
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let scheduler = scheduler();
        scheduler.schedule_job(request("same")).unwrap();
        let err = scheduler.schedule_job(request("same")).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateName { .. }));
        assert_eq!(scheduler.list_jobs().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_carries_the_summary_fields() {
        let scheduler = scheduler();
        let mut req = request("summarised");
        req.description = Some("weekly rollup".to_string());
        scheduler.schedule_job(req).unwrap();

        let jobs = scheduler.list_jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        let summary = &jobs[0];
        assert_eq!(summary.name, "summarised");
        assert_eq!(summary.description.as_deref(), Some("weekly rollup"));
        assert_eq!(summary.frequency, Frequency::Daily);
        assert_eq!(summary.status, JobStatus::Pending);
        assert!(summary.next_run.is_some());
        assert!(summary.last_run.is_none());
    }

    #[tokio::test]
    async fn restore_rearms_only_pending_schedules() {
        let scheduler = scheduler();
        let armed_job = scheduler.schedule_job(request("lives-on")).unwrap();
        let done_job = scheduler.schedule_job(request("finished")).unwrap();
        // Simulate a completed once job, then a cold start.
        scheduler
            .store
            .record_outcome(&done_job.id, JobStatus::Success, None, now())
            .unwrap();
        scheduler.disarm(&armed_job.id);
        scheduler.disarm(&done_job.id);

        let restored = scheduler.restore().unwrap();
        assert_eq!(restored, 1);
        assert!(scheduler.is_armed(&armed_job.id));
        assert!(!scheduler.is_armed(&done_job.id));
    }

    #[tokio::test]
    async fn disarm_clears_the_pending_entry() {
        let scheduler = scheduler();
        let job = scheduler.schedule_job(request("retracted")).unwrap();
        scheduler.disarm(&job.id);
        assert!(!scheduler.is_armed(&job.id));
    }
}
