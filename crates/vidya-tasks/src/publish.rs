//! Publishing approved videos to the shared catalog.
//!
//! Approval requires proof of completion: a [`CompletedTask`] can only be
//! obtained from a task in the `Complete` phase, so there is no runtime
//! "task not finished" error path to handle here.

use tracing::info;
use vidya_catalog::VideoRecord;
use vidya_store::{keys, SharedStore};

// ============================================================================
// CompletedTask
// ============================================================================

/// Proof that a generation task finished with a playable result.
///
/// Obtained via [`GenerationTask::completed`](crate::GenerationTask::completed);
/// the fields are private so the only way to construct one is from a task
/// that actually reached the `Complete` phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    task_id: String,
    result_url: String,
}

impl CompletedTask {
    pub(crate) const fn new(task_id: String, result_url: String) -> Self {
        Self {
            task_id,
            result_url,
        }
    }

    /// Task id assigned by the generation service.
    #[must_use]
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Playback URL of the rendered video.
    #[must_use]
    pub fn result_url(&self) -> &str {
        &self.result_url
    }
}

// ============================================================================
// publish_approval
// ============================================================================

/// Appends a completed task to the shared approved-video catalog.
///
/// The record's id is the service task id, which also keys deduplication
/// when consuming contexts merge the catalog against their progress.
/// Returns the record that was published.
pub fn publish_approval(
    store: &dyn SharedStore,
    task: &CompletedTask,
    title: &str,
    lang: &str,
) -> VideoRecord {
    let record = VideoRecord::new(task.task_id(), title, task.result_url(), lang);
    keys::append_to_catalog(store, record.clone());
    info!(video_id = %record.id, title, "Published approved video to catalog");
    record
}

// ============================================================================
// Tests
// ============================================================================
