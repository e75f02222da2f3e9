//! `querydesk-core` — configuration and shared capability seams.
//!
//! Everything the other crates agree on lives here: the workbench/scheduler
//! boundary trait ([`exec::QueryExecutor`]) and the TOML + env configuration
//! layer ([`config::QuerydeskConfig`]).

pub mod config;
pub mod exec;

pub use config::QuerydeskConfig;
pub use exec::{QueryError, QueryExecutor, QueryOutcome};
