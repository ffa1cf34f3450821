//! Docker runtime installation
//!
//! Fixed ordered sequence driving the vendor convenience script. Package
//! index refresh and prerequisite installs are logged on failure but do
//! not stop the sequence; only the script fetch-and-run steps are fatal.
//! The docker-group modification is a warning at worst, since later
//! commands still work under elevated invocation.

use tracing::{info, warn};

use crate::error::OrchestrateError;
use crate::session::RemoteSession;
use crate::stream::{execute_captured, execute_streamed, OutputSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepFailure {
    Fatal,
    WarnOnly,
}

struct InstallStep {
    label: &'static str,
    command: &'static str,
    on_failure: StepFailure,
}

const INSTALL_STEPS: &[InstallStep] = &[
    InstallStep {
        label: "refresh-package-index",
        command: "sudo apt-get update",
        on_failure: StepFailure::WarnOnly,
    },
    InstallStep {
        label: "install-prerequisites",
        command: "sudo apt-get install -y curl apt-transport-https ca-certificates software-properties-common",
        on_failure: StepFailure::WarnOnly,
    },
    InstallStep {
        label: "fetch-install-script",
        command: "curl -fsSL https://get.docker.com -o get-docker.sh",
        on_failure: StepFailure::Fatal,
    },
    InstallStep {
        label: "run-install-script",
        command: "sudo sh get-docker.sh",
        on_failure: StepFailure::Fatal,
    },
    InstallStep {
        label: "add-user-to-docker-group",
        command: "sudo usermod -aG docker $USER",
        on_failure: StepFailure::WarnOnly,
    },
];

/// Install Docker via the vendor convenience script, then verify.
pub async fn install_runtime(
    session: &dyn RemoteSession,
    sink: &mut dyn OutputSink,
) -> Result<(), OrchestrateError> {
    // A binary from another packaging is still a working runtime.
    let (which, captured) = execute_captured(session, "which docker").await?;
    if which.success() && !captured.stdout_text().trim().is_empty() {
        info!("docker binary already on PATH, keeping existing installation");
        return Ok(());
    }

    for step in INSTALL_STEPS {
        info!(step = step.label, "running install step");
        let result = execute_streamed(session, step.command, true, sink).await?;
        if result.success() {
            continue;
        }
        match step.on_failure {
            StepFailure::Fatal => {
                return Err(OrchestrateError::RuntimeInstallFailed {
                    step: step.label,
                    exit_status: result.exit_status,
                });
            }
            StepFailure::WarnOnly => {
                warn!(
                    step = step.label,
                    exit_status = result.exit_status,
                    "install step failed; continuing"
                );
                if step.label == "add-user-to-docker-group" {
                    warn!("docker commands may need sudo on this host");
                }
            }
        }
    }

    let (verify, captured) = execute_captured(session, "sudo docker --version").await?;
    if verify.success() && !captured.stdout_text().trim().is_empty() {
        info!(version = %captured.stdout_text().trim(), "docker installation verified");
        Ok(())
    } else {
        Err(OrchestrateError::RuntimeInstallFailed {
            step: "verify-installation",
            exit_status: verify.exit_status,
        })
    }
}
