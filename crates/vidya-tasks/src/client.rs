//! Remote generation service client.
//!
//! The service exposes two endpoints:
//!
//! - `POST /api/v1/generate-video` accepting the personalization payload
//!   and answering `{"task_id": "..."}` on acceptance;
//! - `GET /api/v1/check-status/{task_id}` answering
//!   `{"status": ..., "message"?: ..., "url"?: ...}`, where 404 means the
//!   job is not yet visible (or has expired) rather than failed.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vidya_catalog::{StudentProfile, TeacherSelection};

use crate::error::ClientError;

/// Timeout for individual requests to the generation service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Job status string reported for a finished render.
pub const STATUS_COMPLETE: &str = "COMPLETE";

/// Job status string reported for a failed render.
pub const STATUS_FAILED: &str = "FAILED";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Payload for the video-generation submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Name the lesson addresses the student by.
    pub student_name: String,
    /// The topic to teach.
    pub topic: String,
    /// Familiar objects to theme the lesson around (lowercase).
    pub artifacts: Vec<String>,
    /// Character preset identifier (lowercase, underscored).
    pub character_preset: String,
    /// BCP-47 narration language code.
    pub lang: String,
}

impl GenerateRequest {
    /// Builds a request from the stored profile and teacher selections.
    #[must_use]
    pub fn personalized(
        profile: &StudentProfile,
        selection: &TeacherSelection,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            student_name: profile.name.clone(),
            topic: topic.into(),
            artifacts: vec![selection.artifact()],
            character_preset: selection.character_preset(),
            lang: selection.language_code().to_string(),
        }
    }
}

/// Submission endpoint response; only `task_id` is contractual.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    task_id: Option<String>,
}

/// One status-query response.
///
/// The status is kept as the raw server string: the poller only gives
/// special meaning to `COMPLETE` and `FAILED`, every other successful
/// status (`ACCEPTED`, `IN_PROGRESS`, `PENDING`, ...) is a progress
/// update and affects the displayed message only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Raw job status string.
    pub status: String,
    /// Optional human-readable progress or failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Playback URL of the finished video, present once complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StatusReport {
    /// Returns `true` if the job finished successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == STATUS_COMPLETE
    }

    /// Returns `true` if the server reported the job as failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == STATUS_FAILED
    }

    /// Message to show the authoring actor for this report.
    ///
    /// Falls back to `Status: {status}` when the server sent no message.
    #[must_use]
    pub fn display_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("Status: {}", self.status))
    }
}

// ============================================================================
// GenerationClient
// ============================================================================

/// Client for the remote video-generation service.
///
/// Abstracted as a trait so the poller can be driven by a scripted client
/// in tests.
#[async_trait]
pub trait GenerationClient: Send + Sync + 'static {
    /// Submits a generation request, returning the new job's task id.
    async fn submit(&self, request: &GenerateRequest) -> Result<String, ClientError>;

    /// Queries the status of a previously submitted job.
    async fn check_status(&self, task_id: &str) -> Result<StatusReport, ClientError>;
}

/// HTTP implementation of [`GenerationClient`] on top of reqwest.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGenerationClient {
    /// Creates a client for the service at `base_url` (no trailing slash).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the underlying HTTP client
    /// cannot be built. Construction is not allowed to degrade: a client
    /// without the request timeout would hang the poller on a stuck
    /// connection.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("vidya/0.1")
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

#[async_trait]
impl GenerationClient for HttpGenerationClient {
    async fn submit(&self, request: &GenerateRequest) -> Result<String, ClientError> {
        let url = format!("{}/api/v1/generate-video", self.base_url);
        debug!(%url, topic = %request.topic, "Submitting generation request");

        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ClientError::malformed(e.to_string()))?;

        body.task_id
            .ok_or_else(|| ClientError::malformed("response did not include a task_id"))
    }

    async fn check_status(&self, task_id: &str) -> Result<StatusReport, ClientError> {
        let url = format!("{}/api/v1/check-status/{task_id}", self.base_url);
        debug!(%url, "Querying task status");

        let response = self.http.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::malformed(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
