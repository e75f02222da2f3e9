use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
///
/// The first three surface synchronously to the scheduling API caller.
/// `Execution` and `Timeout` only ever arise inside a background run; they
/// are recorded on the job row as `status = error` and never propagate out
/// of the runner.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A job with this name already exists.
    #[error("A job named '{name}' already exists")]
    DuplicateName { name: String },

    /// No job with the given ID exists in the store.
    #[error("Job not found: {id}")]
    JobNotFound { id: String },

    /// The scheduling request is missing or malforms a required field.
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// The stored query failed.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The stored query exceeded its per-job time bound.
    #[error("Execution timed out after {secs}s")]
    Timeout { secs: u32 },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
