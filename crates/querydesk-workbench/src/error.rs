use thiserror::Error;

/// Errors that can occur in the workbench data-access layer.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A saved query with this name already exists.
    #[error("A query named '{name}' already exists")]
    DuplicateName { name: String },

    /// No saved query with the given ID exists.
    #[error("Saved query not found: {id}")]
    NotFound { id: String },

    /// The request is missing or malforms a required field.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Runtime failure outside SQLite itself (e.g. a cancelled worker).
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, WorkbenchError>;
