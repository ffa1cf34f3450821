use clap::{Args, Parser, Subcommand};

pub mod commands;

use crate::workflow::{SecurityProfile, WorkflowKind};

#[derive(Parser)]
#[command(name = "ve3c-control")]
#[command(about = "Remote Docker provisioning and workload orchestration for VE3C hosts")]
#[command(
    long_about = "ve3c-control connects to a target VM over SSH, installs Docker when it is \
                  missing, pulls the workload image with bounded retries, and either launches \
                  the detached VE3C server or runs one bioinformatics workflow to completion \
                  with its output streamed live."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Target VM IP address or hostname
    #[arg(long)]
    pub host: String,
    /// SSH login user (defaults to the configured user)
    #[arg(long)]
    pub user: Option<String>,
    /// Path to the SSH private key (~ is expanded)
    #[arg(long)]
    pub key_file: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the host and launch the detached VE3C server, then tail its logs
    Server {
        #[command(flatten)]
        connection: ConnectionArgs,
        /// CPU cores to allocate to the server container
        #[arg(long, default_value = "2")]
        cpus: u32,
        /// Memory in GB to allocate to the server container
        #[arg(long, default_value = "4")]
        memory_gb: u32,
    },
    /// Provision the host and run one workflow to completion
    Client {
        #[command(flatten)]
        connection: ConnectionArgs,
        /// Security profile selecting the workload image and invocation
        #[arg(long, value_enum)]
        security: SecurityProfile,
        /// Workflow to execute
        #[arg(long, value_enum)]
        workflow: WorkflowKind,
        /// Input dataset file path on the target host
        #[arg(long)]
        dataset_file: Option<String>,
        /// Reference genome file path on the target host
        #[arg(long)]
        reference_genome: Option<String>,
        /// First paired-end file
        #[arg(long)]
        paired_file_1: Option<String>,
        /// Second paired-end file
        #[arg(long)]
        paired_file_2: Option<String>,
        /// Extra flag forwarded to the quality-check tool (e.g. quiet)
        #[arg(long)]
        parameters: Option<String>,
        /// Number of worker threads
        #[arg(long, default_value = "2")]
        threads: u32,
        /// Policy server host
        #[arg(long, default_value = "0.0.0.0")]
        policy_host: String,
        /// Host running the server application
        #[arg(long, default_value = "0.0.0.0")]
        server_app_host: String,
        /// Image pull attempts before giving up
        #[arg(long)]
        pull_retries: Option<u32>,
    },
}
