use rusqlite::Connection;

use crate::error::Result;

/// Initialise the scheduler schema in `conn`.
///
/// Creates the `scheduled_jobs` table (idempotent) and an index on
/// `next_run` so restore-time scans stay cheap with many jobs.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scheduled_jobs (
            id                 TEXT    NOT NULL PRIMARY KEY,
            name               TEXT    NOT NULL UNIQUE,
            description        TEXT,
            query              TEXT    NOT NULL,
            frequency          TEXT    NOT NULL,
            start_time         TEXT    NOT NULL,   -- ISO-8601
            next_run           TEXT,               -- ISO-8601 or NULL once terminal
            last_run           TEXT,               -- ISO-8601 or NULL
            timeout_secs       INTEGER NOT NULL DEFAULT 300,
            retry_count        INTEGER NOT NULL DEFAULT 0,
            notify_on_failure  INTEGER NOT NULL DEFAULT 1,
            status             TEXT    NOT NULL DEFAULT 'pending',
            created_at         TEXT    NOT NULL,
            updated_at         TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_scheduled_jobs_next_run
            ON scheduled_jobs (next_run);
        ",
    )?;
    Ok(())
}
