use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall-clock budget for one execution attempt when the job doesn't set one.
pub const DEFAULT_TIMEOUT_SECS: u32 = 300;

/// How often a job repeats — a closed set, matched exhaustively in the
/// recurrence calculator so a new variant cannot be silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Once,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::Once => "once",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "once" => Ok(Frequency::Once),
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// Outcome of a job's most recent execution attempt — not the health of the
/// schedule as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created but never run.
    Pending,
    /// An attempt is in flight right now.
    Running,
    /// The most recent occurrence succeeded.
    Success,
    /// The most recent occurrence failed (query error or timeout).
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Error => "error",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "running" => Ok(JobStatus::Running),
            "success" => Ok(JobStatus::Success),
            "error" => Ok(JobStatus::Error),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// A persisted scheduled job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    /// UUID v4 string — primary key, assigned at creation.
    pub id: String,
    /// Unique, case-sensitive display name.
    pub name: String,
    /// Optional free-text note shown in listings.
    pub description: Option<String>,
    /// SQL text handed to the store capability verbatim.
    pub query: String,
    pub frequency: Frequency,
    /// Anchor for the first occurrence; immutable once set.
    pub start_time: DateTime<Utc>,
    /// When the job next becomes due. `None` once a `once` job has run.
    pub next_run: Option<DateTime<Utc>>,
    /// Start of the most recent attempt — written before the query begins,
    /// so a crash mid-run leaves a visible trace.
    pub last_run: Option<DateTime<Utc>>,
    pub timeout_secs: u32,
    /// Extra attempts permitted within one occurrence after a failure.
    pub retry_count: u32,
    pub notify_on_failure: bool,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row for the scheduling API.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub start_time: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub status: JobStatus,
}

impl From<ScheduledJob> for JobSummary {
    fn from(job: ScheduledJob) -> Self {
        Self {
            id: job.id,
            name: job.name,
            description: job.description,
            frequency: job.frequency,
            start_time: job.start_time,
            last_run: job.last_run,
            next_run: job.next_run,
            status: job.status,
        }
    }
}

/// Why an occurrence failed — passed to the notifier and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The store rejected the query.
    Query(String),
    /// The attempt exceeded the job's `timeout_secs`.
    Timeout { secs: u32 },
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::Query(msg) => write!(f, "query failed: {msg}"),
            FailureCause::Timeout { secs } => write!(f, "timed out after {secs}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn frequency_text_round_trip() {
        for freq in [
            Frequency::Once,
            Frequency::Hourly,
            Frequency::Daily,
            Frequency::Weekly,
            Frequency::Monthly,
        ] {
            assert_eq!(Frequency::from_str(&freq.to_string()).unwrap(), freq);
        }
        assert!(Frequency::from_str("fortnightly").is_err());
    }

    #[test]
    fn status_text_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Success,
            JobStatus::Error,
        ] {
            assert_eq!(JobStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn failure_cause_names_the_bound() {
        let cause = FailureCause::Timeout { secs: 30 };
        assert_eq!(cause.to_string(), "timed out after 30s");
    }
}
