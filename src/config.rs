use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::docker::ResourceLimits;
use crate::workflow::SecurityProfile;

/// Main configuration structure for ve3c-control
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Remote host defaults
    pub remote: RemoteConfig,
    /// Workload images and reserved resource names
    pub docker: DockerConfig,
    /// Image pull retry policy
    pub pull: PullConfig,
    /// Server container resource limits
    pub limits: ResourceLimits,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Login user when none is given on the command line
    pub default_user: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DockerConfig {
    /// All-in-one workload image (High security profile)
    pub high_image: String,
    /// Minimal direct-toolchain image (Medium/Low profiles)
    pub low_image: String,
    /// Reserved name for the detached service container
    pub server_container: String,
    /// Reserved client container name per profile
    pub high_client_container: String,
    pub low_client_container: String,
    /// Bridged network joining server-side containers
    pub network: String,
}

impl DockerConfig {
    /// Image reference to pull for the given profile.
    pub fn image_for(&self, profile: SecurityProfile) -> &str {
        if profile.is_high() {
            &self.high_image
        } else {
            &self.low_image
        }
    }

    /// Image reference as it appears in `docker run`; the default `latest`
    /// tag is dropped there, matching the registry's own resolution.
    pub fn run_image_for(&self, profile: SecurityProfile) -> &str {
        let image = self.image_for(profile);
        image.strip_suffix(":latest").unwrap_or(image)
    }

    pub fn client_container_for(&self, profile: SecurityProfile) -> &str {
        if profile.is_high() {
            &self.high_client_container
        } else {
            &self.low_client_container
        }
    }

    pub fn server_run_image(&self) -> &str {
        self.high_image.strip_suffix(":latest").unwrap_or(&self.high_image)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PullConfig {
    /// Pull attempts before giving up
    pub max_attempts: u32,
    /// Seconds to wait between failed attempts
    pub delay_seconds: u64,
}

impl PullConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level when RUST_LOG is unset
    pub log_level: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig {
                default_user: "ubuntu".to_string(),
            },
            docker: DockerConfig {
                high_image: "bwbgv/ve3c-image:latest".to_string(),
                low_image: "bwbgv/ve3c-low:latest".to_string(),
                server_container: "ve3c-server".to_string(),
                high_client_container: "ve3c-client".to_string(),
                low_client_container: "ve3c-low-client".to_string(),
                network: "certifier-net".to_string(),
            },
            pull: PullConfig {
                max_attempts: 3,
                delay_seconds: 5,
            },
            limits: ResourceLimits::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. Configuration file (ve3c-control.toml)
    /// 3. Environment variables (prefixed with VE3C_)
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&OrchestratorConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);

        if Path::new("ve3c-control.toml").exists() {
            builder = builder.add_source(File::with_name("ve3c-control"));
        }

        builder = builder.add_source(
            Environment::with_prefix("VE3C")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
