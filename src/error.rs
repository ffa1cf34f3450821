//! Orchestrator error taxonomy
//!
//! Errors raised before the workload command runs abort provisioning
//! immediately; the workload's own non-zero exit is captured as data and
//! classified by the caller, surfacing here only at the application
//! boundary. Cleanup failures are logged where they happen and never
//! escalate into this taxonomy.

use thiserror::Error;

use crate::session::SessionError;
use crate::workflow::RenderError;

#[derive(Debug, Error)]
pub enum OrchestrateError {
    /// The session layer could not reach the host; nothing provisions.
    #[error(transparent)]
    Connection(#[from] SessionError),

    /// The Docker install sequence failed at a fatal step.
    #[error("docker install failed at step '{step}' (exit status {exit_status})")]
    RuntimeInstallFailed { step: &'static str, exit_status: i32 },

    /// Pull retries exhausted; downstream execution needs the image.
    #[error("failed to pull image {image} after {attempts} attempts")]
    ImageUnavailable { image: String, attempts: u32 },

    /// Raised before any remote command is issued.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The rendered workload exited non-zero. Teardown has already run
    /// by the time this is reported.
    #[error("workflow failed, exit={exit_status}")]
    ClientWorkflowFailed { exit_status: i32 },
}
