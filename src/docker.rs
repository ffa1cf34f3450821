//! Docker CLI command surface
//!
//! Builders for every command string the orchestrator dispatches to the
//! remote Docker CLI. Centralized so the wire format stays bit-exact in
//! one place; nothing here talks to the network.

use serde::{Deserialize, Serialize};

/// CPU/memory caps applied to the detached server container.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpus: u32,
    pub memory_gb: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            cpus: 2,
            memory_gb: 4,
        }
    }
}

/// `docker images -q <ref>`; non-empty stdout means the image is local.
pub fn image_query(image: &str) -> String {
    format!("docker images -q {image}")
}

pub fn version_query() -> String {
    "docker --version".to_string()
}

pub fn pull(image: &str) -> String {
    format!("docker pull {image}")
}

/// Forced removal; `|| true` keeps "not found" from failing the command.
pub fn remove_container(name: &str) -> String {
    format!("docker rm -f {name} || true")
}

pub fn remove_network(name: &str) -> String {
    format!("docker network rm {name} || true")
}

/// Guarded removal used before (re)using a reserved container name:
/// remove only when the name is actually listed, succeed either way.
pub fn remove_if_present(name: &str) -> String {
    format!(
        "(docker ps -a --format '{{{{.Names}}}}' | grep -w {name} && docker rm -f {name} || echo 'No container to remove')"
    )
}

/// Bridged network creation; creating an existing network is success.
pub fn network_create(name: &str) -> String {
    format!("docker network create --driver bridge {name} || true")
}

/// Detached service launch publishing the two fixed service ports.
pub fn run_server_detached(
    name: &str,
    network: &str,
    limits: ResourceLimits,
    image: &str,
) -> String {
    format!(
        "docker run -d --name {name} --network {network} \
         --cpus={cpus} --memory={mem}g \
         -p 8123:8123 -p 8124:8124 \
         {image} server \
         --host=0.0.0.0 --policy_host=0.0.0.0 --server_app_host=0.0.0.0",
        cpus = limits.cpus,
        mem = limits.memory_gb,
    )
}

pub fn logs_follow(name: &str) -> String {
    format!("docker logs -f {name}")
}
