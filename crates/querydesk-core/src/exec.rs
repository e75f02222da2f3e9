use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Tabular result of one SQL statement.
///
/// Statements that produce no result set (DDL, INSERT, …) come back with
/// empty `columns` and `rows`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct QueryOutcome {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Opaque failure from the underlying store. The scheduler records it as the
/// run's failure cause; it never inspects the message.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct QueryError(pub String);

/// The store capability consumed by the scheduler and the workbench API:
/// `execute(text) -> rows | error`. The SQL dialect is whatever the backing
/// store accepts — callers treat the text as opaque.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryOutcome, QueryError>;
}
