//! Well-known store keys and typed accessors.
//!
//! Structured records pass through a deterministic JSON encode/decode pair.
//! Decoding a corrupted or missing value always degrades to the type's
//! empty default — store reads are safe by construction and decode
//! problems never reach the caller.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};
use vidya_catalog::{ProgressRecord, StudentProfile, TeacherSelection, VideoRecord};

use crate::store::SharedStore;

/// Catalog of teacher-approved videos (`Vec<VideoRecord>`, JSON array).
pub const APPROVED_VIDEOS: &str = "approvedVideos";

/// The consuming actor's progress records (`Vec<ProgressRecord>`, JSON array).
pub const STUDENT_VIDEOS: &str = "studentVideos";

/// The student's display name (raw string).
pub const STUDENT_NAME: &str = "studentName";

/// Selected language display name (raw string).
pub const TEACHER_LANGUAGE: &str = "teacherLanguage";

/// Selected familiar-object artifact (raw string).
pub const TEACHER_LIKES: &str = "teacherLikes";

/// Selected character preset (raw string).
pub const TEACHER_CHARACTER: &str = "teacherCharacter";

/// Decodes a JSON-encoded value, degrading to the default on any failure.
fn decode_or_default<T: DeserializeOwned + Default>(key: &str, raw: Option<String>) -> T {
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "Corrupt record in shared store, using default");
            T::default()
        }
    }
}

/// Encodes and stores a JSON-encoded value under `key`.
fn encode_and_set<T: Serialize>(store: &dyn SharedStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(e) => {
            // Catalog and progress types serialize infallibly; this guards
            // against future record types that might not.
            error!(key, error = %e, "Failed to encode record for shared store");
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Loads the approved-video catalog, empty if absent or corrupt.
#[must_use]
pub fn load_catalog(store: &dyn SharedStore) -> Vec<VideoRecord> {
    decode_or_default(APPROVED_VIDEOS, store.get(APPROVED_VIDEOS))
}

/// Replaces the approved-video catalog.
pub fn save_catalog(store: &dyn SharedStore, catalog: &[VideoRecord]) {
    encode_and_set(store, APPROVED_VIDEOS, &catalog);
}

/// Appends one record to the catalog.
///
/// Read-modify-write: not atomic across contexts. Two authoring contexts
/// appending at the same time can lose one record; see the workspace
/// design notes for why this is currently accepted.
pub fn append_to_catalog(store: &dyn SharedStore, record: VideoRecord) {
    let mut catalog = load_catalog(store);
    catalog.push(record);
    save_catalog(store, &catalog);
}

// ============================================================================
// Progress
// ============================================================================

/// Loads the consuming actor's progress records, empty if absent or corrupt.
#[must_use]
pub fn load_progress(store: &dyn SharedStore) -> Vec<ProgressRecord> {
    decode_or_default(STUDENT_VIDEOS, store.get(STUDENT_VIDEOS))
}

/// Replaces the progress records.
pub fn save_progress(store: &dyn SharedStore, progress: &[ProgressRecord]) {
    encode_and_set(store, STUDENT_VIDEOS, &progress);
}

/// Marks a video completed in the stored progress (idempotent upsert).
pub fn mark_video_completed(store: &dyn SharedStore, video_id: &str) {
    let mut progress = load_progress(store);
    vidya_catalog::mark_completed(&mut progress, video_id);
    save_progress(store, &progress);
}

// ============================================================================
// Profile and selection
// ============================================================================

/// Loads the student profile, defaulting the name if unset.
#[must_use]
pub fn load_profile(store: &dyn SharedStore) -> StudentProfile {
    store
        .get(STUDENT_NAME)
        .map_or_else(StudentProfile::default, StudentProfile::new)
}

/// Stores the student profile.
pub fn save_profile(store: &dyn SharedStore, profile: &StudentProfile) {
    store.set(STUDENT_NAME, &profile.name);
}

/// Loads the authoring actor's current selections, defaulting each unset field.
#[must_use]
pub fn load_selection(store: &dyn SharedStore) -> TeacherSelection {
    let defaults = TeacherSelection::default();
    TeacherSelection {
        likes: store.get(TEACHER_LIKES).unwrap_or(defaults.likes),
        language: store.get(TEACHER_LANGUAGE).unwrap_or(defaults.language),
        character: store.get(TEACHER_CHARACTER).unwrap_or(defaults.character),
    }
}

/// Stores the authoring actor's selections.
///
/// Each preference is its own key, so this performs three writes and
/// observers are woken once per field.
pub fn save_selection(store: &dyn SharedStore, selection: &TeacherSelection) {
    store.set(TEACHER_LIKES, &selection.likes);
    store.set(TEACHER_LANGUAGE, &selection.language);
    store.set(TEACHER_CHARACTER, &selection.character);
}

// ============================================================================
// Tests
// ============================================================================
