//! `querydesk-workbench` — ad-hoc SQL access to the local SQLite store.
//!
//! Three concerns, all plain data access:
//!
//! * [`executor::SqliteExecutor`] — run arbitrary SQL text and return
//!   `(columns, rows)`. Implements the [`querydesk_core::QueryExecutor`]
//!   capability the scheduler executes jobs through.
//! * [`saved::SavedQueryStore`] — CRUD on named queries.
//! * [`executor::SqliteExecutor::list_tables`] — user-table catalog listing.

pub mod db;
pub mod error;
pub mod executor;
pub mod saved;
pub mod types;

pub use error::{Result, WorkbenchError};
pub use executor::SqliteExecutor;
pub use saved::SavedQueryStore;
pub use types::SavedQuery;
