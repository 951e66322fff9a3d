//! Error types for the generation task lifecycle.
//!
//! The taxonomy separates what happens before the job exists (validation,
//! submission) from what happens while it runs (polling, server-reported
//! failure). A 404 during polling is deliberately *not* in here: it is a
//! transient condition handled inside the poller, not an error.

/// A specialized `Result` type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;

/// Errors that terminate (or pre-empt) a generation task.
///
/// All variants carry a human-readable message shown verbatim to the
/// authoring actor. None of them are retried automatically; recovering
/// from any of them means resubmitting the task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// A required input was empty. Rejected before any network call; the
    /// poller stays in its idle state.
    #[error("Validation failed: {message}")]
    Validation {
        /// What was wrong with the input.
        message: String,
    },

    /// Job creation failed: non-2xx response, malformed payload, or a
    /// transport failure on the submission endpoint.
    #[error("Submission failed: {message}")]
    Submission {
        /// Detail of the submission failure.
        message: String,
    },

    /// A status query failed hard (non-2xx other than 404, or transport
    /// failure). Terminal for the task.
    #[error("Polling Error: {message}")]
    Polling {
        /// Detail of the polling failure.
        message: String,
    },

    /// The generation service reported the job itself as failed.
    #[error("Error: {message}")]
    JobFailure {
        /// The server-supplied failure message.
        message: String,
    },
}

impl TaskError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a new `Submission` error.
    #[must_use]
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission {
            message: message.into(),
        }
    }

    /// Creates a new `Polling` error.
    #[must_use]
    pub fn polling(message: impl Into<String>) -> Self {
        Self::Polling {
            message: message.into(),
        }
    }

    /// Creates a new `JobFailure` error.
    #[must_use]
    pub fn job_failure(message: impl Into<String>) -> Self {
        Self::JobFailure {
            message: message.into(),
        }
    }

    /// Returns `true` if this error left the task in a terminal failed
    /// state (as opposed to never having started it).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Validation { .. })
    }
}

// ============================================================================
// ClientError
// ============================================================================

/// Low-level outcomes of one request to the generation service.
///
/// `NotFound` is separated from the other failures because the poller
/// treats it as "job not yet visible" rather than as an error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP 404: the job is not (yet) visible, or has expired.
    #[error("task not found")]
    NotFound,

    /// Any other non-2xx response.
    #[error("server responded with {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body did not match the documented contract.
    #[error("malformed response: {detail}")]
    Malformed {
        /// What was missing or unparseable.
        detail: String,
    },

    /// The request never produced a response.
    #[error("transport failure: {detail}")]
    Transport {
        /// Detail from the HTTP client.
        detail: String,
    },
}

impl ClientError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed {
            detail: detail.into(),
        }
    }

    /// Returns `true` for the transient not-yet-found condition.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            detail: e.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
