//! Workflow model and parameter validation
//!
//! A [`WorkflowSpec`] is constructed once per invocation from validated
//! input, consumed by the command renderer, and discarded after execution.
//! Invalid kind/parameter combinations are rejected here, before any
//! remote command is issued.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed bioinformatics pipeline variants the client can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    SequenceQuality,
    ReadAlignment,
    IndelCalling,
    SnpCalling,
}

impl WorkflowKind {
    /// Value passed as `--analysis_type` to the workload image's own CLI.
    pub fn analysis_type(&self) -> &'static str {
        match self {
            WorkflowKind::SequenceQuality => "sequence_quality",
            WorkflowKind::ReadAlignment => "read_alignment",
            WorkflowKind::IndelCalling => "indel_calling",
            WorkflowKind::SnpCalling => "snp_calling",
        }
    }
}

/// Choice of workload image and rendering strategy.
///
/// High runs the shared all-in-one image with a uniform client invocation;
/// Medium and Low both render the direct-toolchain pipeline against the
/// minimal image. The two strategies are mutually exclusive over the same
/// [`WorkflowSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SecurityProfile {
    High,
    Medium,
    Low,
}

impl SecurityProfile {
    pub fn is_high(&self) -> bool {
        matches!(self, SecurityProfile::High)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("missing required parameter '{field}' for workflow {kind:?}")]
    MissingParameter {
        field: &'static str,
        kind: WorkflowKind,
    },
}

/// Caller-supplied workflow parameters. Which fields are required depends
/// on the workflow kind; the optional ones stay `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowParams {
    pub dataset_file: Option<String>,
    pub reference_genome: Option<String>,
    pub paired_file_1: Option<String>,
    pub paired_file_2: Option<String>,
    /// Extra flag name forwarded to the quality-check tool (e.g. "quiet").
    pub parameters: Option<String>,
    pub threads: u32,
    pub policy_host: String,
    pub server_app_host: String,
}

impl Default for WorkflowParams {
    fn default() -> Self {
        Self {
            dataset_file: None,
            reference_genome: None,
            paired_file_1: None,
            paired_file_2: None,
            parameters: None,
            threads: 2,
            policy_host: "0.0.0.0".to_string(),
            server_app_host: "0.0.0.0".to_string(),
        }
    }
}

/// One validated "run workflow X with security profile Y" request.
#[derive(Debug, Clone)]
pub struct WorkflowSpec {
    kind: WorkflowKind,
    profile: SecurityProfile,
    params: WorkflowParams,
}

impl WorkflowSpec {
    /// Validate the kind/parameter combination and freeze the spec.
    /// Fails fast with the first missing required field.
    pub fn new(
        kind: WorkflowKind,
        profile: SecurityProfile,
        params: WorkflowParams,
    ) -> Result<Self, RenderError> {
        let spec = Self {
            kind,
            profile,
            params,
        };
        for field in required_fields(kind) {
            spec.require(field)?;
        }
        Ok(spec)
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn profile(&self) -> SecurityProfile {
        self.profile
    }

    pub fn params(&self) -> &WorkflowParams {
        &self.params
    }

    /// Fetch a required parameter, or fail naming the field.
    pub fn require(&self, field: &'static str) -> Result<&str, RenderError> {
        let value = match field {
            "dataset_file" => self.params.dataset_file.as_deref(),
            "reference_genome" => self.params.reference_genome.as_deref(),
            "paired_file_1" => self.params.paired_file_1.as_deref(),
            "paired_file_2" => self.params.paired_file_2.as_deref(),
            "parameters" => self.params.parameters.as_deref(),
            _ => None,
        };
        value.ok_or(RenderError::MissingParameter {
            field,
            kind: self.kind,
        })
    }
}

/// Required parameter set per workflow kind. Identical across profiles;
/// the High profile's policy/server hosts are defaulted, never missing.
pub fn required_fields(kind: WorkflowKind) -> &'static [&'static str] {
    match kind {
        WorkflowKind::SequenceQuality => &["dataset_file", "parameters"],
        WorkflowKind::ReadAlignment => &["reference_genome", "paired_file_1", "paired_file_2"],
        WorkflowKind::IndelCalling | WorkflowKind::SnpCalling => {
            &["reference_genome", "dataset_file"]
        }
    }
}

/// Normalize a caller-supplied path for the remote execution context.
///
/// The orchestrator's own working directory means nothing on the target
/// host, so relative paths resolve against the host's data root.
pub fn absolutize(path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    let trimmed = path.strip_prefix("./").unwrap_or(path);
    format!("/root/{trimmed}")
}

/// Derive the output base name from an input path by dropping its
/// directory and extension. Total: a name without an extension maps to
/// itself, which also makes the derivation idempotent on such names.
pub fn derive_base_name(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name[..dot].to_string(),
        _ => file_name.to_string(),
    }
}

/// Strip the extension from a path while keeping its directory, for
/// sibling artifacts like sequence dictionaries.
pub fn strip_extension(path: &str) -> String {
    match path.rfind('.') {
        Some(dot) if dot > path.rfind('/').map_or(0, |s| s + 1) => path[..dot].to_string(),
        _ => path.to_string(),
    }
}
