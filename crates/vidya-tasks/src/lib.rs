//! Vidya Generation Tasks
//!
//! Drives the asynchronous video-generation job: submission to the remote
//! service, fixed-interval status polling until a terminal state, and
//! publication of an approved result into the shared catalog.

pub mod client;
pub mod error;
pub mod poller;
pub mod publish;
pub mod task;

pub use client::{GenerateRequest, GenerationClient, HttpGenerationClient, StatusReport};
pub use error::{ClientError, TaskError};
pub use poller::{PollHandle, TaskPoller, DEFAULT_POLL_INTERVAL};
pub use publish::{publish_approval, CompletedTask};
pub use task::{GenerationTask, TaskPhase};
