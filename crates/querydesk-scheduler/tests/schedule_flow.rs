// End-to-end: a scheduled job persisted in SQLite fires through the
// dispatcher, executes real SQL via the workbench executor and settles its
// run-state, exactly as the daemon wires it up.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;

use querydesk_core::exec::QueryExecutor;
use querydesk_scheduler::{
    db::init_db, Frequency, JobStatus, JobStore, LogNotifier, ScheduleRequest, Scheduler,
    SystemClock,
};
use querydesk_workbench::SqliteExecutor;

fn scheduler_with_live_executor() -> Scheduler {
    let store_conn = Connection::open_in_memory().unwrap();
    init_db(&store_conn).unwrap();

    let data_conn = Connection::open_in_memory().unwrap();
    data_conn
        .execute_batch(
            "CREATE TABLE metrics (day TEXT, total INTEGER);
             INSERT INTO metrics VALUES ('2024-01-01', 42);",
        )
        .unwrap();

    Scheduler::new(
        Arc::new(JobStore::new(store_conn)),
        Arc::new(SqliteExecutor::new(data_conn, 4)) as Arc<dyn QueryExecutor>,
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    )
}

fn request(name: &str, query: &str, frequency: Frequency) -> ScheduleRequest {
    ScheduleRequest {
        name: name.to_string(),
        description: None,
        query: query.to_string(),
        frequency,
        // Already due, so the dispatcher fires as soon as it is armed.
        start_time: Utc::now() - chrono::Duration::seconds(5),
        timeout_secs: None,
        retry_count: None,
        notify_on_failure: None,
    }
}

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_for_status(scheduler: &Scheduler, job_id: &str, wanted: JobStatus) {
    let jobs = || scheduler.list_jobs().unwrap();
    wait_until("job status", || {
        jobs().iter().any(|j| j.id == job_id && j.status == wanted)
    })
    .await;
}

#[tokio::test]
async fn overdue_once_job_fires_exactly_once_and_disarms() {
    let scheduler = scheduler_with_live_executor();
    let job = scheduler
        .schedule_job(request(
            "totals",
            "SELECT day, total FROM metrics",
            Frequency::Once,
        ))
        .unwrap();

    wait_for_status(&scheduler, &job.id, JobStatus::Success).await;

    let summary = scheduler
        .list_jobs()
        .unwrap()
        .into_iter()
        .find(|j| j.id == job.id)
        .unwrap();
    assert_eq!(summary.next_run, None);
    assert!(summary.last_run.is_some());
    assert!(!scheduler.is_armed(&job.id));
}

#[tokio::test]
async fn recurring_job_advances_and_stays_armed() {
    let scheduler = scheduler_with_live_executor();
    let job = scheduler
        .schedule_job(request(
            "rollup",
            "SELECT COUNT(*) FROM metrics",
            Frequency::Daily,
        ))
        .unwrap();

    wait_for_status(&scheduler, &job.id, JobStatus::Success).await;
    // The dispatcher re-arms just after the outcome is written.
    wait_until("re-arm", || scheduler.is_armed(&job.id)).await;

    let summary = scheduler
        .list_jobs()
        .unwrap()
        .into_iter()
        .find(|j| j.id == job.id)
        .unwrap();
    // Advanced exactly one day from the anchor, regardless of when the run
    // actually happened.
    assert_eq!(
        summary.next_run,
        Some(job.start_time + chrono::Duration::days(1))
    );
}

#[tokio::test]
async fn failing_job_records_error_and_still_advances() {
    let scheduler = scheduler_with_live_executor();
    let job = scheduler
        .schedule_job(request(
            "broken",
            "SELECT * FROM table_that_is_not_there",
            Frequency::Hourly,
        ))
        .unwrap();

    wait_for_status(&scheduler, &job.id, JobStatus::Error).await;
    wait_until("re-arm", || scheduler.is_armed(&job.id)).await;

    let summary = scheduler
        .list_jobs()
        .unwrap()
        .into_iter()
        .find(|j| j.id == job.id)
        .unwrap();
    assert_eq!(
        summary.next_run,
        Some(job.start_time + chrono::Duration::hours(1))
    );
}
