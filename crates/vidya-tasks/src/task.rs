//! In-memory state of one generation task.
//!
//! A `GenerationTask` lives only in the authoring context's working memory
//! while the review modal is open; it is never persisted. Only the poller
//! mutates it, and discarding the modal discards the task.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::publish::CompletedTask;

// ============================================================================
// TaskPhase
// ============================================================================

/// Lifecycle phase of a generation task.
///
/// Transitions:
/// - `Idle` -> `Submitting` on submission (after synchronous validation)
/// - `Submitting` -> `Polling` once the service returns a task id
/// - `Submitting` -> `Failed` on any submission failure
/// - `Polling` -> `Polling` on transient or progress responses
/// - `Polling` -> `Complete` | `Failed` on a terminal status report
/// - any -> `Idle` via reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    /// No task in flight.
    #[default]
    Idle,
    /// Submission request sent, waiting for the task id.
    Submitting,
    /// Task accepted; status is queried at a fixed interval.
    Polling,
    /// The video was rendered; the result URL is available.
    Complete,
    /// The task failed, either at submission or during polling.
    Failed,
}

impl TaskPhase {
    /// Returns `true` if no further polling will occur.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

// ============================================================================
// GenerationTask
// ============================================================================

/// Snapshot of the current generation task.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationTask {
    /// Current lifecycle phase.
    pub phase: TaskPhase,

    /// Task id assigned by the service, once submission succeeded.
    pub task_id: Option<String>,

    /// Latest message for display to the authoring actor.
    pub message: String,

    /// Playback URL of the finished video, once complete.
    pub result_url: Option<String>,

    /// When this task was created.
    pub started_at: DateTime<Utc>,

    /// When the task state last changed.
    pub updated_at: DateTime<Utc>,
}

impl Default for GenerationTask {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationTask {
    /// Creates an idle task with no history.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            phase: TaskPhase::Idle,
            task_id: None,
            message: String::new(),
            result_url: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if no further polling will occur.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Returns the proof of completion needed to publish this task.
    ///
    /// `None` unless the task is in the `Complete` phase with both a task
    /// id and a result URL; publishing is impossible otherwise.
    #[must_use]
    pub fn completed(&self) -> Option<CompletedTask> {
        if self.phase != TaskPhase::Complete {
            return None;
        }
        match (&self.task_id, &self.result_url) {
            (Some(task_id), Some(url)) => Some(CompletedTask::new(task_id.clone(), url.clone())),
            _ => None,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub(crate) fn begin_submitting(&mut self) {
        self.phase = TaskPhase::Submitting;
        self.message = "Sending request to generate video...".to_string();
        self.touch();
    }

    pub(crate) fn begin_polling(&mut self, task_id: String) {
        self.phase = TaskPhase::Polling;
        self.task_id = Some(task_id);
        self.message = "Request accepted. Waiting for video generation to start...".to_string();
        self.touch();
    }

    pub(crate) fn progress(&mut self, message: String) {
        self.message = message;
        self.touch();
    }

    pub(crate) fn complete(&mut self, url: String, message: String) {
        self.phase = TaskPhase::Complete;
        self.result_url = Some(url);
        self.message = message;
        self.touch();
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.phase = TaskPhase::Failed;
        self.message = message;
        self.touch();
    }
}

// ============================================================================
// Tests
// ============================================================================
