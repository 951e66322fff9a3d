//! Vidya Lesson Catalog
//!
//! Data model for the shared lesson catalog: published video records,
//! per-student progress records, and the pure merge that combines the two
//! into a status-annotated view.

pub mod merge;
pub mod profile;
pub mod record;

pub use merge::{merge, AnnotatedVideo};
pub use profile::{
    StudentProfile, TeacherSelection, CHARACTER_OPTIONS, LANGUAGE_OPTIONS, LIKES_OPTIONS,
};
pub use record::{mark_completed, ProgressRecord, VideoRecord, WatchStatus};
