use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, WorkbenchError};
use crate::types::SavedQuery;

/// Thread-safe store for named queries.
///
/// Wraps a single SQLite connection in a `Mutex`, the same shape the
/// schedule store uses. Names are unique and case-sensitive.
pub struct SavedQueryStore {
    conn: Mutex<Connection>,
}

impl SavedQueryStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Persist a new named query. Fails with `DuplicateName` if the name is
    /// taken; the store is unchanged in that case.
    pub fn save(&self, name: &str, query: &str) -> Result<SavedQuery> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorkbenchError::InvalidRequest("name is required".into()));
        }
        if query.trim().is_empty() {
            return Err(WorkbenchError::InvalidRequest("query is required".into()));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let conn = self.conn.lock().unwrap();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO saved_queries (id, name, query, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![id, name, query, now.to_rfc3339()],
        )?;
        if inserted == 0 {
            return Err(WorkbenchError::DuplicateName { name: name.into() });
        }

        info!(query_id = %id, %name, "query saved");
        Ok(SavedQuery {
            id,
            name: name.to_string(),
            query: query.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// All saved queries, most recently created first.
    pub fn list(&self) -> Result<Vec<SavedQuery>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, query, created_at, updated_at
             FROM saved_queries ORDER BY created_at DESC, id DESC",
        )?;
        let queries = stmt
            .query_map([], row_to_saved_query)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(queries)
    }

    /// Replace the SQL text of an existing saved query.
    pub fn update(&self, id: &str, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(WorkbenchError::InvalidRequest("query is required".into()));
        }
        let conn = self.conn.lock().unwrap();
        let n = conn.execute(
            "UPDATE saved_queries SET query = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![query, Utc::now().to_rfc3339(), id],
        )?;
        if n == 0 {
            return Err(WorkbenchError::NotFound { id: id.into() });
        }
        debug!(query_id = %id, "query updated");
        Ok(())
    }

    /// Rename a saved query. The new name must be free.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(WorkbenchError::InvalidRequest("new name is required".into()));
        }
        let conn = self.conn.lock().unwrap();
        let taken: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM saved_queries WHERE name = ?1)",
                [new_name],
                |row| row.get(0),
            )?;
        if taken {
            return Err(WorkbenchError::DuplicateName {
                name: new_name.into(),
            });
        }
        let n = conn.execute(
            "UPDATE saved_queries SET name = ?1, updated_at = ?2 WHERE name = ?3",
            rusqlite::params![new_name, Utc::now().to_rfc3339(), old_name],
        )?;
        if n == 0 {
            return Err(WorkbenchError::NotFound {
                id: old_name.into(),
            });
        }
        info!(old = %old_name, new = %new_name, "query renamed");
        Ok(())
    }

    /// Remove a saved query by name. Removing an unknown name is a no-op.
    pub fn delete(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let n = conn.execute("DELETE FROM saved_queries WHERE name = ?1", [name])?;
        debug!(%name, removed = n, "query deleted");
        Ok(())
    }
}

fn row_to_saved_query(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavedQuery> {
    Ok(SavedQuery {
        id: row.get(0)?,
        name: row.get(1)?,
        query: row.get(2)?,
        created_at: parse_ts(3, &row.get::<_, String>(3)?)?,
        updated_at: parse_ts(4, &row.get::<_, String>(4)?)?,
    })
}

fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
