//! Submission and status polling for generation tasks.
//!
//! [`TaskPoller`] owns the task state machine: it validates and submits a
//! request, then queries the service at a fixed interval until the job
//! reaches a terminal status. Every state change is guarded by an epoch
//! counter so that responses arriving after a [`TaskPoller::reset`] are
//! discarded instead of resurrecting a dismissed task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::client::GenerationClient;
use crate::error::TaskError;
use crate::task::{GenerationTask, TaskPhase};
use crate::GenerateRequest;

/// How often the service is asked for the job status.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

// ============================================================================
// TaskPoller
// ============================================================================

struct Inner {
    task: GenerationTask,
    /// Bumped on every reset; in-flight work from an older epoch may not
    /// touch the task.
    epoch: u64,
    /// Abort handle of the running poll loop, so a reset can stop the
    /// timer immediately instead of waiting for its next tick.
    worker: Option<AbortHandle>,
}

/// Drives one generation task from submission to a terminal phase.
///
/// Cheap to clone; all clones share the same task state.
pub struct TaskPoller<C: GenerationClient> {
    client: Arc<C>,
    inner: Arc<Mutex<Inner>>,
    poll_interval: Duration,
}

impl<C: GenerationClient> Clone for TaskPoller<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            inner: Arc::clone(&self.inner),
            poll_interval: self.poll_interval,
        }
    }
}

impl<C: GenerationClient> TaskPoller<C> {
    /// Creates a poller using the default poll interval.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self::with_interval(client, DEFAULT_POLL_INTERVAL)
    }

    /// Creates a poller that polls at `poll_interval`.
    #[must_use]
    pub fn with_interval(client: C, poll_interval: Duration) -> Self {
        Self {
            client: Arc::new(client),
            inner: Arc::new(Mutex::new(Inner {
                task: GenerationTask::new(),
                epoch: 0,
                worker: None,
            })),
            poll_interval,
        }
    }

    /// Returns a copy of the current task state.
    pub async fn snapshot(&self) -> GenerationTask {
        self.inner.lock().await.task.clone()
    }

    /// Discards the current task and invalidates all in-flight work.
    ///
    /// The poll timer is cancelled immediately, and responses that are
    /// already in flight for the discarded task are ignored; the next
    /// observed state is a fresh idle task.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(worker) = inner.worker.take() {
            worker.abort();
        }
        inner.epoch += 1;
        inner.task = GenerationTask::new();
        debug!(epoch = inner.epoch, "Task poller reset");
    }

    /// Submits a generation request and starts polling for its status.
    ///
    /// Validation happens before anything is sent: an empty topic fails
    /// immediately with [`TaskError::Validation`] and the task stays idle.
    /// On success the returned [`PollHandle`] can cancel or await the
    /// polling loop.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] for an empty topic or a task
    /// already in flight, and [`TaskError::Submission`] when the service
    /// rejects or never receives the request.
    pub async fn submit(&self, request: GenerateRequest) -> Result<PollHandle, TaskError> {
        if request.topic.trim().is_empty() {
            return Err(TaskError::validation("topic must not be empty"));
        }

        let epoch = {
            let mut inner = self.inner.lock().await;
            if matches!(inner.task.phase, TaskPhase::Submitting | TaskPhase::Polling) {
                return Err(TaskError::validation("a generation task is already in flight"));
            }
            inner.task = GenerationTask::new();
            inner.task.begin_submitting();
            inner.epoch
        };

        info!(topic = %request.topic, "Submitting video generation request");
        let submitted = self.client.submit(&request).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!("Submission response arrived after reset, discarding");
            return Ok(PollHandle { handle: None });
        }

        let task_id = match submitted {
            Ok(task_id) => task_id,
            Err(e) => {
                let err = TaskError::submission(e.to_string());
                inner.task.fail(err.to_string());
                return Err(err);
            }
        };

        inner.task.begin_polling(task_id.clone());
        info!(%task_id, "Generation task accepted, polling for status");

        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.client),
            Arc::clone(&self.inner),
            epoch,
            task_id,
            self.poll_interval,
        ));
        // Registered under the same lock so a concurrent reset cannot miss
        // the loop it needs to cancel.
        inner.worker = Some(handle.abort_handle());
        drop(inner);
        Ok(PollHandle {
            handle: Some(handle),
        })
    }
}

/// Queries the job status once per interval until the task is terminal or
/// the epoch moves on.
async fn poll_loop<C: GenerationClient>(
    client: Arc<C>,
    inner: Arc<Mutex<Inner>>,
    epoch: u64,
    task_id: String,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the first status query should
    // happen one full interval after submission.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        {
            let inner = inner.lock().await;
            if inner.epoch != epoch || inner.task.is_terminal() {
                return;
            }
        }

        let outcome = client.check_status(&task_id).await;

        let mut inner = inner.lock().await;
        if inner.epoch != epoch || inner.task.is_terminal() {
            debug!(%task_id, "Status response arrived after reset, discarding");
            return;
        }

        match outcome {
            Err(e) if e.is_transient() => {
                // The job is not visible yet; keep waiting without touching
                // the displayed message.
                debug!(%task_id, "Task not visible yet, will retry");
            }
            Err(e) => {
                let err = TaskError::polling(e.to_string());
                warn!(%task_id, error = %e, "Status polling failed");
                inner.task.fail(err.to_string());
                return;
            }
            Ok(report) if report.is_complete() => {
                match report.url {
                    Some(url) => {
                        info!(%task_id, %url, "Video generation complete");
                        inner.task.complete(url, "Video generated successfully.".to_string());
                    }
                    None => {
                        let err =
                            TaskError::polling("job completed without a result URL");
                        warn!(%task_id, "Complete status carried no result URL");
                        inner.task.fail(err.to_string());
                    }
                }
                return;
            }
            Ok(report) if report.is_failed() => {
                let err = TaskError::job_failure(report.display_message());
                warn!(%task_id, "Generation job failed");
                inner.task.fail(err.to_string());
                return;
            }
            Ok(report) => {
                debug!(%task_id, status = %report.status, "Generation in progress");
                inner.task.progress(report.display_message());
            }
        }
    }
}

// ============================================================================
// PollHandle
// ============================================================================

/// Capability over a running polling loop.
///
/// Dropping the handle cancels the loop, so the caller that submitted the
/// task keeps sole control over its polling lifetime.
#[derive(Debug)]
pub struct PollHandle {
    handle: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Stops the polling loop without changing the task state.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Returns `true` once the polling loop has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the polling loop to reach a terminal phase.
    pub async fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            // Abort is the only way the loop can be torn down externally,
            // so a join error here only means the loop was cancelled.
            let _ = handle.await;
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
