//! Integration tests for cross-context persistence and change propagation.
//!
//! Two `JsonFileStore` handles over the same file behave like two browser
//! tabs: writes from one context are durable, visible to the other, and
//! announced only to contexts that did not perform the write.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vidya_catalog::{StudentProfile, VideoRecord};
use vidya_store::{keys, ChangeNotifier, JsonFileStore, SharedStore};

/// Yields long enough for subscriber tasks to observe pending events.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn test_write_in_one_context_is_read_in_another() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");

    let teacher = JsonFileStore::open(&path, ChangeNotifier::default()).expect("open store");
    let student = teacher.another_context();

    keys::save_profile(&teacher, &StudentProfile::new("Rohan"));
    keys::append_to_catalog(&teacher, VideoRecord::new("t1", "Addition", "u1", "en"));

    assert_eq!(keys::load_profile(&student).name, "Rohan");
    let catalog = keys::load_catalog(&student);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].title, "Addition");
}

#[tokio::test]
async fn test_data_survives_reopening_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");

    {
        let store = JsonFileStore::open(&path, ChangeNotifier::default()).expect("open store");
        keys::append_to_catalog(&store, VideoRecord::new("t1", "Addition", "u1", "en"));
        keys::append_to_catalog(&store, VideoRecord::new("t2", "Shapes", "u2", "hi"));
    }

    // A completely fresh process over the same file sees the catalog.
    let reopened = JsonFileStore::open(&path, ChangeNotifier::default()).expect("reopen store");
    let catalog = keys::load_catalog(&reopened);
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[1].id, "t2");
}

#[tokio::test]
async fn test_corrupt_store_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");
    std::fs::write(&path, "{ this is not json").expect("write corrupt file");

    let store = JsonFileStore::open(&path, ChangeNotifier::default()).expect("open store");
    assert!(keys::load_catalog(&store).is_empty());
    assert_eq!(keys::load_profile(&store).name, "Student");

    // Writing through the store replaces the corrupt file.
    keys::append_to_catalog(&store, VideoRecord::new("t1", "Addition", "u1", "en"));
    assert_eq!(keys::load_catalog(&store).len(), 1);
}

#[tokio::test]
async fn test_catalog_write_wakes_only_other_contexts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");

    let notifier = ChangeNotifier::default();
    let teacher = JsonFileStore::open(&path, notifier.clone()).expect("open store");
    let student = teacher.another_context();

    let student_wakes = Arc::new(AtomicUsize::new(0));
    let teacher_wakes = Arc::new(AtomicUsize::new(0));

    let seen = Arc::clone(&student_wakes);
    let _student_sub = notifier.subscribe(
        student.context(),
        |key| key == keys::APPROVED_VIDEOS,
        move || {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    );
    let seen = Arc::clone(&teacher_wakes);
    let _teacher_sub = notifier.subscribe(
        teacher.context(),
        |key| key == keys::APPROVED_VIDEOS,
        move || {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    );
    settle().await;

    keys::append_to_catalog(&teacher, VideoRecord::new("t1", "Addition", "u1", "en"));
    settle().await;

    // The student is woken; the writing context is not.
    assert_eq!(student_wakes.load(Ordering::SeqCst), 1);
    assert_eq!(teacher_wakes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_progress_writes_do_not_wake_catalog_watchers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");

    let notifier = ChangeNotifier::default();
    let teacher = JsonFileStore::open(&path, notifier.clone()).expect("open store");
    let student = teacher.another_context();

    let wakes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&wakes);
    let _sub = notifier.subscribe(
        teacher.context(),
        |key| key == keys::APPROVED_VIDEOS,
        move || {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    );
    settle().await;

    keys::mark_video_completed(&student, "t1");
    settle().await;

    assert_eq!(wakes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_handler_rereads_see_the_committed_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shared.json");

    let notifier = ChangeNotifier::default();
    let teacher = JsonFileStore::open(&path, notifier.clone()).expect("open store");
    let student = teacher.another_context();

    // The handler re-reads the store; the notification contract says the
    // write is already committed when it runs.
    let observed = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&observed);
    let reader = student.another_context();
    let _sub = notifier.subscribe(
        student.context(),
        |key| key == keys::APPROVED_VIDEOS,
        move || {
            seen.store(keys::load_catalog(&reader).len(), Ordering::SeqCst);
        },
    );
    settle().await;

    keys::append_to_catalog(&teacher, VideoRecord::new("t1", "Addition", "u1", "en"));
    settle().await;

    assert_eq!(observed.load(Ordering::SeqCst), 1);
}
