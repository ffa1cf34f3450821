use anyhow::Result;
use clap::Parser;

use ve3c_control::cli::{commands, Cli, Commands};
use ve3c_control::config::OrchestratorConfig;
use ve3c_control::docker::ResourceLimits;
use ve3c_control::telemetry::init_telemetry;
use ve3c_control::workflow::WorkflowParams;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = OrchestratorConfig::load_env_file();
    let log_level = OrchestratorConfig::load()
        .map(|c| c.observability.log_level)
        .unwrap_or_else(|_| "info".to_string());
    init_telemetry(&log_level)?;

    match cli.command {
        Commands::Server {
            connection,
            cpus,
            memory_gb,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            commands::server::run(
                connection,
                ResourceLimits {
                    cpus,
                    memory_gb,
                },
            )
            .await
        }),
        Commands::Client {
            connection,
            security,
            workflow,
            dataset_file,
            reference_genome,
            paired_file_1,
            paired_file_2,
            parameters,
            threads,
            policy_host,
            server_app_host,
            pull_retries,
        } => {
            let exit_status = tokio::runtime::Runtime::new()?.block_on(async {
                commands::client::run(commands::client::ClientArgs {
                    connection,
                    security,
                    workflow,
                    params: WorkflowParams {
                        dataset_file,
                        reference_genome,
                        paired_file_1,
                        paired_file_2,
                        parameters,
                        threads,
                        policy_host,
                        server_app_host,
                    },
                    pull_retries,
                })
                .await
            })?;
            if exit_status != 0 {
                // The workload's status is this process's status.
                std::process::exit(exit_status);
            }
            Ok(())
        }
    }
}
