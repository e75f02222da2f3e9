//! `querydesk-scheduler` — durable scheduled execution of stored queries.
//!
//! # Overview
//!
//! Jobs are persisted to a SQLite `scheduled_jobs` table. The
//! [`dispatcher::Dispatcher`] holds one timer entry per armed job and, when
//! a job's `next_run` arrives, hands it to the [`runner::ExecutionRunner`]
//! exactly once. The runner executes the job's query through the store
//! capability, records the outcome, advances `next_run` for recurring jobs
//! and returns the new fire time so the dispatcher can re-arm.
//!
//! # Frequency variants
//!
//! | Variant   | Behaviour                                             |
//! |-----------|-------------------------------------------------------|
//! | `Once`    | Single fire at `start_time`; terminal afterwards      |
//! | `Hourly`  | Previous slot + 1 hour                                |
//! | `Daily`   | Previous slot + 1 day                                 |
//! | `Weekly`  | Previous slot + 7 days                                |
//! | `Monthly` | Previous slot + 30 days (fixed offset, not calendar)  |
//!
//! Advancement is always relative to the previous *scheduled* slot, never
//! the actual fire time, so execution delays do not shift the schedule.

pub mod clock;
pub mod db;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod notify;
pub mod recurrence;
pub mod runner;
pub mod store;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use dispatcher::{Dispatcher, JobRunner};
pub use engine::{ScheduleRequest, Scheduler};
pub use error::{Result, SchedulerError};
pub use notify::{LogNotifier, Notifier};
pub use runner::ExecutionRunner;
pub use store::JobStore;
pub use types::{FailureCause, Frequency, JobStatus, JobSummary, ScheduledJob};
