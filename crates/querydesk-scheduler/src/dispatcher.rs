use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::clock::Clock;

/// Callback the dispatcher fires for each due occurrence.
///
/// Implementations execute the occurrence and return the next fire time,
/// or `None` when the schedule is terminal (a completed `once` job, or a
/// job whose state could not be persisted).
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run_job(&self, job_id: &str) -> Option<DateTime<Utc>>;
}

/// Time-driven trigger: one pending timer entry per armed job.
///
/// Each `arm` spawns a task that sleeps until the fire time, fires the
/// runner exactly once and re-arms itself with the runner's returned next
/// time. Because the next timer only exists after `run_job` has returned,
/// occurrences of the same job can never overlap; distinct jobs each have
/// their own task and run concurrently.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

struct Inner {
    clock: Arc<dyn Clock>,
    armed: DashMap<String, JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                armed: DashMap::new(),
            }),
        }
    }

    /// Schedule a single invocation of `runner.run_job(job_id)` at or after
    /// `fire_at`. A `fire_at` already in the past fires immediately rather
    /// than being rejected — a due occurrence the process slept through
    /// still runs once. Arming an already-armed job replaces its entry.
    pub fn arm(&self, runner: Arc<dyn JobRunner>, job_id: &str, fire_at: DateTime<Utc>) {
        Inner::arm(&self.inner, runner, job_id, fire_at);
    }

    /// Cancel the pending invocation for a job, if any. An execution that
    /// has already started is left to finish — disarming only prevents
    /// future firings.
    pub fn disarm(&self, job_id: &str) {
        if let Some((_, handle)) = self.inner.armed.remove(job_id) {
            handle.abort();
            debug!(job_id = %job_id, "job disarmed");
        }
    }

    /// Whether a pending timer entry exists for the job.
    pub fn is_armed(&self, job_id: &str) -> bool {
        self.inner.armed.contains_key(job_id)
    }

    /// Number of pending timer entries.
    pub fn armed_count(&self) -> usize {
        self.inner.armed.len()
    }
}

impl Inner {
    fn arm(inner: &Arc<Inner>, runner: Arc<dyn JobRunner>, job_id: &str, fire_at: DateTime<Utc>) {
        let delay = (fire_at - inner.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let state = Arc::clone(inner);
        let id = job_id.to_string();

        // The timer must not fire before its entry is registered below,
        // otherwise the handle inserted for the NEXT occurrence could be
        // clobbered and aborted by our own insert.
        let (registered_tx, registered_rx) = tokio::sync::oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            if registered_rx.await.is_err() {
                return;
            }
            tokio::time::sleep(delay).await;
            // Drop our own entry first so a disarm issued from here on
            // cannot abort the in-flight execution.
            state.armed.remove(&id);
            if let Some(next_fire) = runner.run_job(&id).await {
                Inner::arm(&state, runner, &id, next_fire);
            }
        });

        if let Some(previous) = inner.armed.insert(job_id.to_string(), handle) {
            previous.abort();
        }
        let _ = registered_tx.send(());
        debug!(job_id = %job_id, %fire_at, "job armed");
    }
}
