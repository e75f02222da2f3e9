use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, SchedulerError};
use crate::types::{Frequency, JobStatus, ScheduledJob};

/// Durable record of every scheduled job and its mutable run-state.
///
/// Wraps a single SQLite connection in a `Mutex`: each mutation is one SQL
/// UPDATE, so writes to a job's row are atomic and writes to different rows
/// never observe each other half-applied.
pub struct JobStore {
    conn: Mutex<Connection>,
}

impl JobStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Persist a fully-built job. Fails with `DuplicateName` when the name
    /// is taken; the store is unchanged in that case.
    pub fn create(&self, job: &ScheduledJob) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO scheduled_jobs
             (id, name, description, query, frequency, start_time, next_run,
              last_run, timeout_secs, retry_count, notify_on_failure, status,
              created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,NULL,?8,?9,?10,?11,?12,?12)",
            rusqlite::params![
                job.id,
                job.name,
                job.description,
                job.query,
                job.frequency.to_string(),
                job.start_time.to_rfc3339(),
                job.next_run.map(|dt| dt.to_rfc3339()),
                job.timeout_secs,
                job.retry_count,
                job.notify_on_failure,
                job.status.to_string(),
                job.created_at.to_rfc3339(),
            ],
        )?;
        if inserted == 0 {
            return Err(SchedulerError::DuplicateName {
                name: job.name.clone(),
            });
        }
        debug!(job_id = %job.id, name = %job.name, "job persisted");
        Ok(())
    }

    /// Load a job by ID.
    pub fn get(&self, id: &str) -> Result<ScheduledJob> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            &format!("SELECT {JOB_COLUMNS} FROM scheduled_jobs WHERE id = ?1"),
            [id],
            row_to_job,
        ) {
            Ok(job) => Ok(job),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Err(SchedulerError::JobNotFound { id: id.to_string() })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Entry half of a run: `status = running`, `last_run = started_at`.
    /// Written before the query begins so an in-flight (or crashed) attempt
    /// is observable.
    pub fn mark_running(&self, id: &str, started_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE scheduled_jobs
             SET status = 'running', last_run = ?1, updated_at = ?1
             WHERE id = ?2",
            rusqlite::params![started_at.to_rfc3339(), id],
        )?;
        if n == 0 {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// Exit half of a run: final status plus the advanced `next_run`
    /// (`None` freezes the schedule — a completed `once` job).
    pub fn record_outcome(
        &self,
        id: &str,
        status: JobStatus,
        next_run: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE scheduled_jobs
             SET status = ?1, next_run = ?2, updated_at = ?3
             WHERE id = ?4",
            rusqlite::params![
                status.to_string(),
                next_run.map(|dt| dt.to_rfc3339()),
                at.to_rfc3339(),
                id
            ],
        )?;
        if n == 0 {
            return Err(SchedulerError::JobNotFound { id: id.to_string() });
        }
        Ok(())
    }

    /// All jobs, most recently created first.
    pub fn list(&self) -> Result<Vec<ScheduledJob>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs ORDER BY created_at DESC, rowid DESC"
        ))?;
        let jobs = stmt
            .query_map([], row_to_job)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

const JOB_COLUMNS: &str = "id, name, description, query, frequency, start_time, next_run, \
                           last_run, timeout_secs, retry_count, notify_on_failure, status, \
                           created_at, updated_at";

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledJob> {
    Ok(ScheduledJob {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        query: row.get(3)?,
        frequency: parse_text(4, &row.get::<_, String>(4)?, Frequency::from_str)?,
        start_time: parse_ts(5, &row.get::<_, String>(5)?)?,
        next_run: parse_opt_ts(6, row.get::<_, Option<String>>(6)?)?,
        last_run: parse_opt_ts(7, row.get::<_, Option<String>>(7)?)?,
        timeout_secs: row.get(8)?,
        retry_count: row.get(9)?,
        notify_on_failure: row.get(10)?,
        status: parse_text(11, &row.get::<_, String>(11)?, JobStatus::from_str)?,
        created_at: parse_ts(12, &row.get::<_, String>(12)?)?,
        updated_at: parse_ts(13, &row.get::<_, String>(13)?)?,
    })
}

fn parse_text<T>(
    idx: usize,
    s: &str,
    parse: impl Fn(&str) -> std::result::Result<T, String>,
) -> rusqlite::Result<T> {
    parse(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_opt_ts(idx: usize, s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.map(|s| parse_ts(idx, &s)).transpose()
}
