//! Detection job orchestrator.
//!
//! Jobs are submitted synchronously (upload and records) and then processed
//! by a detached task per job. The [`JobRegistry`] maps each in-flight job to
//! the token that cancels its remote call.

mod registry;
mod runner;
mod types;

pub use registry::JobRegistry;
pub use runner::DetectionOrchestrator;
pub use types::{
    generate_storage_key, JobSource, OrchestratorError, OrchestratorStatus, SubmitRequest,
    STREAM_SCHEME,
};
