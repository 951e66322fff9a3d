//! Catalog and progress record types.
//!
//! This module defines the two persisted record kinds: `VideoRecord`, a
//! published lesson in the authoritative catalog, and `ProgressRecord`, the
//! consuming actor's per-video completion marker.

use serde::{Deserialize, Serialize};

// ============================================================================
// VideoRecord
// ============================================================================

/// A published lesson video in the shared catalog.
///
/// Created when the authoring actor approves a completed generation task;
/// immutable thereafter. The `id` is the identifier of the originating
/// generation task, which makes it unique within the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Opaque unique identifier (the originating task id).
    pub id: String,

    /// Lesson title, as entered by the authoring actor.
    pub title: String,

    /// Playback URL of the rendered video.
    pub url: String,

    /// BCP-47 language code the lesson was narrated in.
    pub lang: String,
}

impl VideoRecord {
    /// Creates a new `VideoRecord`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        lang: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            lang: lang.into(),
        }
    }
}

// ============================================================================
// WatchStatus
// ============================================================================

/// Completion status attached to a catalog record when merged with progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    /// Not yet watched by the consuming actor.
    #[default]
    New,
    /// Watched to the end and closed.
    Completed,
}

impl WatchStatus {
    /// Returns `true` if the video has been watched.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

// ============================================================================
// ProgressRecord
// ============================================================================

/// The consuming actor's completion marker for one catalog record.
///
/// At most one record exists per video id. A progress record whose id has
/// no matching catalog entry is inert: it is never surfaced, but also never
/// deleted, so it applies again if the catalog record reappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Id of the `VideoRecord` this progress refers to.
    pub id: String,

    /// Completion status reported by the consuming actor.
    pub status: WatchStatus,
}

impl ProgressRecord {
    /// Creates a completed progress record for the given video id.
    #[must_use]
    pub fn completed(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: WatchStatus::Completed,
        }
    }
}

/// Marks the video with the given id completed in a progress list.
///
/// Idempotent upsert: if a record for the id already exists its status is
/// set to `Completed`, otherwise one record is appended. Calling this twice
/// with the same id leaves exactly one record for that id.
pub fn mark_completed(progress: &mut Vec<ProgressRecord>, id: &str) {
    if let Some(existing) = progress.iter_mut().find(|r| r.id == id) {
        existing.status = WatchStatus::Completed;
    } else {
        progress.push(ProgressRecord::completed(id));
    }
}

// ============================================================================
// Tests
// ============================================================================
