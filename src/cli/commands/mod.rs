use std::sync::Arc;

use anyhow::Result;

use crate::cli::ConnectionArgs;
use crate::config::OrchestratorConfig;
use crate::session::SshSession;

pub mod client;
pub mod server;

/// Open and verify the SSH session before any provisioning starts; a
/// connection failure aborts the run with nothing dispatched.
pub async fn connect(
    connection: &ConnectionArgs,
    config: &OrchestratorConfig,
) -> Result<Arc<SshSession>> {
    let user = connection
        .user
        .as_deref()
        .unwrap_or(&config.remote.default_user);
    let session = SshSession::new(&connection.host, user, &connection.key_file)?;
    tracing::info!(host = %connection.host, user, "verifying connectivity");
    session.preflight().await?;
    Ok(Arc::new(session))
}
