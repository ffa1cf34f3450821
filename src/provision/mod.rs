//! Provisioning state machine
//!
//! One parameterized flow per target host: ensure the Docker runtime,
//! ensure the workload image, then branch on role. Steps are strictly
//! sequential; a later step never begins before the prior remote command
//! has reported its exit status. Terminal failures short-circuit to
//! teardown, which always runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cleanup::{self, ResourceHandle};
use crate::config::OrchestratorConfig;
use crate::docker;
use crate::error::OrchestrateError;
use crate::render;
use crate::session::RemoteSession;
use crate::stream::{execute_captured, execute_streamed, run_to_completion, OutputSink};
use crate::workflow::WorkflowSpec;

pub mod install;
pub mod pull;

pub use pull::{PullOutcome, RetryPolicy, RetryingPuller};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// Observable states of one provisioning run. `RuntimeInstall` and
/// `ImagePull` are skipped when the corresponding check already passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Init,
    RuntimeCheck,
    RuntimeInstall,
    ImageCheck,
    ImagePull,
    RoleDispatch,
    ServerLaunch,
    ClientRun,
    Teardown,
    Done,
}

/// Outcome of a client-role run. Non-zero exit is a classification, not
/// an orchestrator fault; teardown has run either way.
#[derive(Debug, Clone, Copy)]
pub struct ClientReport {
    pub exit_status: i32,
    pub duration: Duration,
}

impl ClientReport {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }

    pub fn summary(&self) -> String {
        if self.success() {
            "workflow completed successfully".to_string()
        } else {
            format!("workflow failed, exit={}", self.exit_status)
        }
    }
}

pub struct Orchestrator {
    session: Arc<dyn RemoteSession>,
    config: OrchestratorConfig,
    state: ProvisionState,
}

impl Orchestrator {
    pub fn new(session: Arc<dyn RemoteSession>, config: OrchestratorConfig) -> Self {
        Self {
            session,
            config,
            state: ProvisionState::Init,
        }
    }

    pub fn state(&self) -> ProvisionState {
        self.state
    }

    fn transition(&mut self, to: ProvisionState) {
        info!(from = ?self.state, to = ?to, "provisioning transition");
        self.state = to;
    }

    fn dispatch(&mut self, role: Role) {
        self.transition(ProvisionState::RoleDispatch);
        info!(role = ?role, "dispatching role procedure");
        self.transition(match role {
            Role::Server => ProvisionState::ServerLaunch,
            Role::Client => ProvisionState::ClientRun,
        });
    }

    /// Run one workflow to completion on the target host. Teardown of the
    /// reserved client container runs exactly once, on success and on
    /// every failure path alike.
    pub async fn run_client(
        &mut self,
        spec: &WorkflowSpec,
        sink: &mut dyn OutputSink,
    ) -> Result<ClientReport, OrchestrateError> {
        let outcome = self.client_flow(spec, sink).await;

        self.transition(ProvisionState::Teardown);
        let container = self
            .config
            .docker
            .client_container_for(spec.profile())
            .to_string();
        cleanup::remove(self.session.as_ref(), &ResourceHandle::Container(container)).await;
        self.transition(ProvisionState::Done);

        outcome
    }

    async fn client_flow(
        &mut self,
        spec: &WorkflowSpec,
        sink: &mut dyn OutputSink,
    ) -> Result<ClientReport, OrchestrateError> {
        // Rendering is pure; surface contract violations before any
        // remote command is issued.
        let rendered = render::render(spec, &self.config.docker)?;

        self.ensure_runtime(sink).await?;
        let image = self.config.docker.image_for(spec.profile()).to_string();
        self.ensure_image(&image, sink).await?;

        self.dispatch(Role::Client);

        let session = Arc::clone(&self.session);
        let reserved = self.config.docker.client_container_for(spec.profile());

        // A crashed prior run may have left the reserved name behind.
        execute_streamed(
            session.as_ref(),
            &docker::remove_if_present(reserved),
            false,
            sink,
        )
        .await?;

        info!(workflow = ?spec.kind(), profile = ?spec.profile(), "starting client workflow");
        for stage in rendered.stages() {
            info!(stage = stage.label, "pipeline stage queued");
        }

        let result = execute_streamed(session.as_ref(), rendered.command(), true, sink).await?;
        let report = ClientReport {
            exit_status: result.exit_status,
            duration: result.duration,
        };
        if report.success() {
            info!(duration_secs = result.duration.as_secs(), "client workflow completed");
        } else {
            warn!(exit_status = report.exit_status, "client workflow failed");
        }
        Ok(report)
    }

    /// Launch the detached service container and monitor its logs until
    /// `cancel` resolves. Cancellation stops local observation only; the
    /// remote service and its named resources are left running.
    pub async fn run_server(
        &mut self,
        cancel: impl Future<Output = ()>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), OrchestrateError> {
        let outcome = self.server_flow(cancel, sink).await;

        self.transition(ProvisionState::Teardown);
        info!("server resources left running; only log monitoring was detached");
        self.transition(ProvisionState::Done);

        outcome
    }

    async fn server_flow(
        &mut self,
        cancel: impl Future<Output = ()>,
        sink: &mut dyn OutputSink,
    ) -> Result<(), OrchestrateError> {
        self.ensure_runtime(sink).await?;
        let image = self.config.docker.high_image.clone();
        self.ensure_image(&image, sink).await?;

        self.dispatch(Role::Server);

        let session = Arc::clone(&self.session);
        let network = self.config.docker.network.clone();
        let container = self.config.docker.server_container.clone();

        execute_streamed(session.as_ref(), &docker::network_create(&network), false, sink).await?;
        execute_streamed(
            session.as_ref(),
            &docker::remove_container(&container),
            false,
            sink,
        )
        .await?;

        let launch = docker::run_server_detached(
            &container,
            &network,
            self.config.limits,
            self.config.docker.server_run_image(),
        );
        let result = execute_streamed(session.as_ref(), &launch, false, sink).await?;
        if !result.success() {
            // The name may still be serving from an earlier launch; the
            // log stream below tells the operator either way.
            warn!(exit_status = result.exit_status, "server launch reported failure");
        }

        info!(container = %container, "monitoring server logs (interrupt to stop)");
        let logs = session
            .execute(&docker::logs_follow(&container), true)
            .await?;
        tokio::select! {
            _ = cancel => {
                info!("stopped monitoring server logs");
            }
            _ = run_to_completion(logs, sink) => {
                info!("server log stream ended");
            }
        }
        Ok(())
    }

    async fn ensure_runtime(&mut self, sink: &mut dyn OutputSink) -> Result<(), OrchestrateError> {
        self.transition(ProvisionState::RuntimeCheck);
        let session = Arc::clone(&self.session);
        let (result, captured) = execute_captured(session.as_ref(), &docker::version_query()).await?;
        let version = captured.stdout_text().trim().to_string();
        if result.success() && version.starts_with("Docker version") {
            info!(%version, "docker already installed");
            return Ok(());
        }

        self.transition(ProvisionState::RuntimeInstall);
        install::install_runtime(session.as_ref(), sink).await
    }

    async fn ensure_image(
        &mut self,
        image: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<(), OrchestrateError> {
        self.transition(ProvisionState::ImageCheck);
        let puller = RetryingPuller::new(RetryPolicy {
            max_attempts: self.config.pull.max_attempts,
            delay: self.config.pull.delay(),
        });
        let session = Arc::clone(&self.session);
        match puller.ensure_present(session.as_ref(), image, sink).await? {
            PullOutcome::AlreadyPresent => {}
            PullOutcome::Pulled { .. } => self.transition(ProvisionState::ImagePull),
        }
        Ok(())
    }
}
