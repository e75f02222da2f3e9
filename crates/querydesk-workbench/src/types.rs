use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, reusable query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQuery {
    /// UUID v4 string — primary key.
    pub id: String,
    /// Unique, case-sensitive display name.
    pub name: String,
    /// The SQL text.
    pub query: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
