//! Named-resource cleanup
//!
//! Removal of reserved containers and networks on the remote host.
//! Absence is success, removal is forced, and a cleanup failure is logged
//! but never escalated so it cannot mask the error that preceded it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::docker;
use crate::session::RemoteSession;
use crate::stream::execute_captured;

/// A container or network known only by its reserved name. The
/// orchestrator never assumes exclusive ownership; every handle is
/// idempotently creatable and idempotently removable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceHandle {
    Container(String),
    Network(String),
}

impl ResourceHandle {
    pub fn name(&self) -> &str {
        match self {
            ResourceHandle::Container(name) | ResourceHandle::Network(name) => name,
        }
    }

    fn removal_command(&self) -> String {
        match self {
            ResourceHandle::Container(name) => docker::remove_container(name),
            ResourceHandle::Network(name) => docker::remove_network(name),
        }
    }
}

/// Remove `handle` if present. Returns true when the resource is gone
/// (including when it never existed); false only when the removal could
/// not be attempted or was rejected, which is logged and otherwise
/// swallowed by callers.
pub async fn remove(session: &dyn RemoteSession, handle: &ResourceHandle) -> bool {
    match execute_captured(session, &handle.removal_command()).await {
        Ok((result, _)) if result.success() => {
            info!(resource = %handle.name(), "cleanup complete");
            true
        }
        Ok((result, sink)) => {
            warn!(
                resource = %handle.name(),
                exit_status = result.exit_status,
                stderr = %String::from_utf8_lossy(&sink.stderr).trim(),
                "cleanup failed; continuing"
            );
            false
        }
        Err(e) => {
            warn!(resource = %handle.name(), error = %e, "cleanup could not be dispatched; continuing");
            false
        }
    }
}
