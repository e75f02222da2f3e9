use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::debug;

use querydesk_core::exec::{QueryError, QueryExecutor, QueryOutcome};

use crate::error::{Result, WorkbenchError};

/// Executes arbitrary SQL against a SQLite connection.
///
/// Statements run on the blocking thread pool so the async runtime is never
/// stalled by a slow query. A semaphore caps how many statements may be in
/// flight at once; a permit travels into the blocking closure and is only
/// released when SQLite returns, so queries abandoned by a caller's timeout
/// still count against the cap until they finish.
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
    slots: Arc<Semaphore>,
}

impl SqliteExecutor {
    pub fn new(conn: Connection, max_in_flight: usize) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            slots: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    /// Run one SQL statement and collect its full result set.
    pub async fn run(&self, sql: &str) -> Result<QueryOutcome> {
        let sql = sql.trim().to_string();
        if sql.is_empty() {
            return Err(WorkbenchError::InvalidRequest("query is empty".into()));
        }

        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|e| WorkbenchError::Internal(e.to_string()))?;
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let conn = conn.lock().unwrap();
            let mut stmt = conn.prepare(&sql)?;

            // DDL / DML without a result set: execute and report empty shape.
            if stmt.column_count() == 0 {
                let affected = stmt.execute([])?;
                debug!(affected, "statement executed");
                return Ok(QueryOutcome::default());
            }

            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let ncols = columns.len();
            let mut out = Vec::new();
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(ncols);
                for i in 0..ncols {
                    values.push(value_to_json(row.get_ref(i)?));
                }
                out.push(values);
            }
            debug!(rows = out.len(), "query executed");
            Ok(QueryOutcome { columns, rows: out })
        })
        .await
        .map_err(|e| WorkbenchError::Internal(e.to_string()))?
    }

    /// List user tables, skipping SQLite's internal `sqlite_*` bookkeeping.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )?;
            let tables = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tables)
        })
        .await
        .map_err(|e| WorkbenchError::Internal(e.to_string()))?
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str) -> std::result::Result<QueryOutcome, QueryError> {
        self.run(sql).await.map_err(|e| QueryError(e.to_string()))
    }
}

fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
    }
}
