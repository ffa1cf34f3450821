// ve3c-control Library - Remote Workload Orchestration
// This exposes the core components for testing and integration

pub mod cleanup;
pub mod cli;
pub mod config;
pub mod docker;
pub mod error;
pub mod provision;
pub mod render;
pub mod session;
pub mod stream;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use cleanup::ResourceHandle;
pub use config::{DockerConfig, OrchestratorConfig};
pub use docker::ResourceLimits;
pub use error::OrchestrateError;
pub use provision::{
    ClientReport, Orchestrator, ProvisionState, PullOutcome, RetryPolicy, RetryingPuller, Role,
};
pub use render::{render, RenderedCommand, Stage};
pub use session::{RemoteExecution, RemoteSession, SessionError, SshSession};
pub use stream::{
    execute_captured, execute_streamed, run_to_completion, CaptureSink, ConsoleSink,
    ExecutionResult, OutputSink,
};
pub use telemetry::init_telemetry;
pub use workflow::{
    derive_base_name, RenderError, SecurityProfile, WorkflowKind, WorkflowParams, WorkflowSpec,
};
