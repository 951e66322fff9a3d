//! Pure merge of the authoritative catalog with consumer progress.
//!
//! The merge is the unit the consuming view is rebuilt from on every change
//! notification. It is pure and cheap, so handlers can simply re-run it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::record::{ProgressRecord, VideoRecord, WatchStatus};

/// A catalog record annotated with the consuming actor's completion status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedVideo {
    /// The underlying catalog record.
    #[serde(flatten)]
    pub record: VideoRecord,

    /// Whether the consuming actor has completed this video.
    pub status: WatchStatus,
}

/// Merges the catalog with the consumer's progress records.
///
/// Every catalog record appears exactly once in the output, in catalog
/// order (insertion order is the display order). A record is annotated
/// `Completed` when a progress record with the same id reports completion,
/// `New` otherwise. Progress records with no matching catalog entry are
/// ignored.
///
/// # Examples
///
/// ```
/// use vidya_catalog::{merge, ProgressRecord, VideoRecord, WatchStatus};
///
/// let catalog = vec![VideoRecord::new("t1", "Addition", "u1", "en")];
/// let progress = vec![ProgressRecord::completed("t1")];
///
/// let view = merge(&catalog, &progress);
/// assert_eq!(view.len(), 1);
/// assert_eq!(view[0].status, WatchStatus::Completed);
/// ```
#[must_use]
pub fn merge(catalog: &[VideoRecord], progress: &[ProgressRecord]) -> Vec<AnnotatedVideo> {
    let completed: HashSet<&str> = progress
        .iter()
        .filter(|p| p.status.is_completed())
        .map(|p| p.id.as_str())
        .collect();

    catalog
        .iter()
        .map(|record| AnnotatedVideo {
            record: record.clone(),
            status: if completed.contains(record.id.as_str()) {
                WatchStatus::Completed
            } else {
                WatchStatus::New
            },
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
