//! End-to-end integration tests for the generation workflow.
//!
//! These tests run the real HTTP client against a mock generation service
//! and carry a completed task all the way into the shared catalog, where
//! the student-side merge picks it up.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vidya_catalog::{merge, StudentProfile, TeacherSelection, WatchStatus};
use vidya_store::{keys, ChangeNotifier, MemoryStore, SharedStore};
use vidya_tasks::{
    publish_approval, GenerateRequest, HttpGenerationClient, TaskError, TaskPhase, TaskPoller,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Poll interval short enough to keep these tests fast.
const TEST_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builds a request from stored personalization, the way the CLI does.
fn personalized_request(store: &dyn SharedStore, topic: &str) -> GenerateRequest {
    let profile = keys::load_profile(store);
    let selection = keys::load_selection(store);
    GenerateRequest::personalized(&profile, &selection, topic)
}

async fn mock_submit_accepting(server: &MockServer, task_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/v1/generate-video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": task_id,
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_generation_to_catalog_flow() {
    let server = MockServer::start().await;
    mock_submit_accepting(&server, "task-42").await;

    // The job is invisible for one poll, reports progress once, then
    // completes with a playable URL.
    Mock::given(method("GET"))
        .and(path("/api/v1/check-status/task-42"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/check-status/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "IN_PROGRESS",
            "message": "Rendering scene 1",
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/check-status/task-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "COMPLETE",
            "url": "https://cdn.local/task-42.mp4",
        })))
        .mount(&server)
        .await;

    // Teacher context with stored personalization.
    let notifier = ChangeNotifier::default();
    let teacher_store = MemoryStore::new(notifier.clone());
    keys::save_profile(&teacher_store, &StudentProfile::new("Rohan"));
    keys::save_selection(
        &teacher_store,
        &TeacherSelection {
            likes: "Panda".to_string(),
            language: "Hindi".to_string(),
            character: "Chhota Bheem".to_string(),
        },
    );

    let request = personalized_request(&teacher_store, "Counting to ten");
    assert_eq!(request.student_name, "Rohan");
    assert_eq!(request.lang, "hi");
    assert_eq!(request.character_preset, "chhota_bheem");

    // Drive the task to completion.
    let client = HttpGenerationClient::new(server.uri()).expect("client should build");
    let poller = TaskPoller::with_interval(client, TEST_POLL_INTERVAL);
    let handle = poller.submit(request).await.expect("submission failed");
    handle.wait().await;

    let task = poller.snapshot().await;
    assert_eq!(task.phase, TaskPhase::Complete);
    let completed = task.completed().expect("task should carry completion proof");

    // The student context is woken by the approval, never before.
    let student_store = teacher_store.another_context();
    let wakes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&wakes);
    let _sub = notifier.subscribe(
        student_store.context(),
        |key| key == keys::APPROVED_VIDEOS,
        move || {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    );
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(wakes.load(Ordering::SeqCst), 0);

    let record = publish_approval(&teacher_store, &completed, "Counting to ten", "hi");
    assert_eq!(record.id, "task-42");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(wakes.load(Ordering::SeqCst), 1);

    // Student sees the approved video as new, then completes it.
    let view = merge(
        &keys::load_catalog(&student_store),
        &keys::load_progress(&student_store),
    );
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].record.url, "https://cdn.local/task-42.mp4");
    assert_eq!(view[0].status, WatchStatus::New);

    keys::mark_video_completed(&student_store, "task-42");
    let view = merge(
        &keys::load_catalog(&student_store),
        &keys::load_progress(&student_store),
    );
    assert_eq!(view[0].status, WatchStatus::Completed);
}

#[tokio::test]
async fn test_failed_job_is_not_publishable() {
    let server = MockServer::start().await;
    mock_submit_accepting(&server, "task-9").await;

    Mock::given(method("GET"))
        .and(path("/api/v1/check-status/task-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "FAILED",
            "message": "render crashed",
        })))
        .mount(&server)
        .await;

    let client = HttpGenerationClient::new(server.uri()).expect("client should build");
    let poller = TaskPoller::with_interval(client, TEST_POLL_INTERVAL);
    let request = personalized_request(&MemoryStore::new(ChangeNotifier::default()), "Shapes");

    let handle = poller.submit(request).await.expect("submission failed");
    handle.wait().await;

    let task = poller.snapshot().await;
    assert_eq!(task.phase, TaskPhase::Failed);
    assert_eq!(task.message, "Error: render crashed");
    // No completion proof exists, so nothing can reach the catalog.
    assert!(task.completed().is_none());
}

#[tokio::test]
async fn test_rejected_submission_reports_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/generate-video"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGenerationClient::new(server.uri()).expect("client should build");
    let poller = TaskPoller::with_interval(client, TEST_POLL_INTERVAL);
    let request = personalized_request(&MemoryStore::new(ChangeNotifier::default()), "Shapes");

    let err = poller.submit(request).await.expect_err("should fail");
    assert!(matches!(err, TaskError::Submission { .. }));
    assert_eq!(poller.snapshot().await.phase, TaskPhase::Failed);
}
