use anyhow::Result;

use crate::cli::ConnectionArgs;
use crate::config::OrchestratorConfig;
use crate::error::OrchestrateError;
use crate::provision::Orchestrator;
use crate::stream::ConsoleSink;
use crate::workflow::{SecurityProfile, WorkflowKind, WorkflowParams, WorkflowSpec};

pub struct ClientArgs {
    pub connection: ConnectionArgs,
    pub security: SecurityProfile,
    pub workflow: WorkflowKind,
    pub params: WorkflowParams,
    pub pull_retries: Option<u32>,
}

/// Run one workflow on the target host and propagate its exit status as
/// this process's own. Teardown has already run by the time we report.
pub async fn run(args: ClientArgs) -> Result<i32> {
    let mut config = OrchestratorConfig::load()?;
    if let Some(retries) = args.pull_retries {
        config.pull.max_attempts = retries.max(1);
    }

    // Contract violations surface before the session is even opened.
    let spec = WorkflowSpec::new(args.workflow, args.security, args.params)?;

    let session = super::connect(&args.connection, &config).await?;
    let mut orchestrator = Orchestrator::new(session, config);

    let mut sink = ConsoleSink;
    match orchestrator.run_client(&spec, &mut sink).await {
        Ok(report) => {
            if report.success() {
                tracing::info!(
                    duration_secs = report.duration.as_secs(),
                    "{}",
                    report.summary()
                );
                Ok(0)
            } else {
                let failure = OrchestrateError::ClientWorkflowFailed {
                    exit_status: report.exit_status,
                };
                tracing::error!("{failure}");
                Ok(report.exit_status)
            }
        }
        Err(e) => Err(e.into()),
    }
}
