use anyhow::Result;

use crate::cli::ConnectionArgs;
use crate::config::OrchestratorConfig;
use crate::docker::ResourceLimits;
use crate::provision::Orchestrator;
use crate::stream::ConsoleSink;

/// Provision the host, launch the detached server, and tail its logs
/// until the operator interrupts. The remote service keeps running after
/// monitoring stops.
pub async fn run(connection: ConnectionArgs, limits: ResourceLimits) -> Result<()> {
    let mut config = OrchestratorConfig::load()?;
    config.limits = limits;

    let session = super::connect(&connection, &config).await?;
    let mut orchestrator = Orchestrator::new(session, config);

    let cancel = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    let mut sink = ConsoleSink;
    orchestrator.run_server(cancel, &mut sink).await?;
    Ok(())
}
