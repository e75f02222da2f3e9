use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::types::FailureCause;

/// External collaborator told about failed occurrences when a job opts in
/// with `notify_on_failure`. Best-effort: the runner logs a delivery error
/// and moves on — a broken notifier never blocks the job's state machine.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, job_id: &str, cause: &FailureCause) -> Result<()>;
}

/// Stub notifier that records the failure in the log stream.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, job_id: &str, cause: &FailureCause) -> Result<()> {
        warn!(job_id = %job_id, %cause, "scheduled job failed");
        Ok(())
    }
}
