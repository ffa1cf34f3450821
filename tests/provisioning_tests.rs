//! End-to-end provisioning flows against scripted hosts.

use std::sync::Arc;
use std::time::Duration;

mod fixtures;
use fixtures::{provisioned_host, FakeSession, ScriptedResponse};

use ve3c_control::cleanup::{self, ResourceHandle};
use ve3c_control::config::OrchestratorConfig;
use ve3c_control::error::OrchestrateError;
use ve3c_control::provision::Orchestrator;
use ve3c_control::session::RemoteSession;
use ve3c_control::stream::CaptureSink;
use ve3c_control::workflow::{SecurityProfile, WorkflowKind, WorkflowParams, WorkflowSpec};

fn low_alignment_spec() -> WorkflowSpec {
    WorkflowSpec::new(
        WorkflowKind::ReadAlignment,
        SecurityProfile::Low,
        WorkflowParams {
            reference_genome: Some("ref.fa".to_string()),
            paired_file_1: Some("a.fastq".to_string()),
            paired_file_2: Some("b.fastq".to_string()),
            threads: 4,
            ..WorkflowParams::default()
        },
    )
    .unwrap()
}

fn orchestrator(session: &Arc<FakeSession>) -> Orchestrator {
    let session: Arc<dyn RemoteSession> = session.clone();
    Orchestrator::new(session, OrchestratorConfig::default())
}

#[tokio::test(start_paused = true)]
async fn healthy_runtime_skips_install_entirely() {
    let session = Arc::new(provisioned_host());
    let mut sink = CaptureSink::default();

    let report = orchestrator(&session)
        .run_client(&low_alignment_spec(), &mut sink)
        .await
        .unwrap();

    assert!(report.success());
    assert_eq!(session.count_matching("apt-get"), 0);
    assert_eq!(session.count_matching("get-docker.sh"), 0);
    assert_eq!(session.count_matching("which docker"), 0);
}

#[tokio::test(start_paused = true)]
async fn provisioning_steps_run_in_strict_sequence() {
    let session = Arc::new(provisioned_host());
    let mut sink = CaptureSink::default();

    orchestrator(&session)
        .run_client(&low_alignment_spec(), &mut sink)
        .await
        .unwrap();

    let commands = session.dispatched();
    let position = |needle: &str| {
        commands
            .iter()
            .position(|c| c.contains(needle))
            .unwrap_or_else(|| panic!("missing command matching {needle}"))
    };

    let version = position("docker --version");
    let image_check = position("docker images -q");
    let pre_clean = position("docker ps -a --format");
    let run = position("docker run --rm --name ve3c-low-client");
    let teardown = position("docker rm -f ve3c-low-client || true");

    assert!(version < image_check);
    assert!(image_check < pre_clean);
    assert!(pre_clean < run);
    assert!(run < teardown);
}

#[tokio::test(start_paused = true)]
async fn failed_workflow_is_reported_and_torn_down_once() {
    let session = Arc::new(provisioned_host().on(
        "docker run --rm --name ve3c-low-client",
        ScriptedResponse::exit(7).with_stderr("picard: aborting\n"),
    ));
    let mut sink = CaptureSink::default();

    let report = orchestrator(&session)
        .run_client(&low_alignment_spec(), &mut sink)
        .await
        .unwrap();

    assert!(!report.success());
    assert_eq!(report.exit_status, 7);
    assert_eq!(report.summary(), "workflow failed, exit=7");
    assert_eq!(
        session.count_matching("docker rm -f ve3c-low-client || true"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn missing_runtime_triggers_the_install_sequence() {
    let session = Arc::new(
        FakeSession::new()
            // Verification runs under sudo and must match before the
            // plain version probe.
            .on(
                "sudo docker --version",
                ScriptedResponse::ok().with_stdout("Docker version 24.0.7, build afdd53b\n"),
            )
            .on(
                "docker --version",
                ScriptedResponse::exit(127).with_stderr("docker: command not found\n"),
            )
            .on("which docker", ScriptedResponse::exit(1))
            .on(
                "docker images -q",
                ScriptedResponse::ok().with_stdout("a1b2c3d4e5f6\n"),
            ),
    );
    let mut sink = CaptureSink::default();

    let report = orchestrator(&session)
        .run_client(&low_alignment_spec(), &mut sink)
        .await
        .unwrap();

    assert!(report.success());
    assert_eq!(session.count_matching("sudo apt-get update"), 1);
    assert_eq!(session.count_matching("curl -fsSL https://get.docker.com"), 1);
    assert_eq!(session.count_matching("sudo sh get-docker.sh"), 1);
    assert_eq!(session.count_matching("sudo usermod -aG docker"), 1);
}

#[tokio::test(start_paused = true)]
async fn fatal_install_step_aborts_but_still_tears_down() {
    let session = Arc::new(
        FakeSession::new()
            .on("docker --version", ScriptedResponse::exit(127))
            .on("which docker", ScriptedResponse::exit(1))
            .on(
                "curl -fsSL https://get.docker.com",
                ScriptedResponse::exit(6).with_stderr("could not resolve host\n"),
            ),
    );
    let mut sink = CaptureSink::default();

    let err = orchestrator(&session)
        .run_client(&low_alignment_spec(), &mut sink)
        .await
        .unwrap_err();

    match err {
        OrchestrateError::RuntimeInstallFailed { step, exit_status } => {
            assert_eq!(step, "fetch-install-script");
            assert_eq!(exit_status, 6);
        }
        other => panic!("expected RuntimeInstallFailed, got {other:?}"),
    }
    // The install script never ran, and cleanup still happened exactly once.
    assert_eq!(session.count_matching("sudo sh get-docker.sh"), 0);
    assert_eq!(
        session.count_matching("docker rm -f ve3c-low-client || true"),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn group_modification_failure_is_degraded_success() {
    let session = Arc::new(
        FakeSession::new()
            .on(
                "sudo docker --version",
                ScriptedResponse::ok().with_stdout("Docker version 24.0.7, build afdd53b\n"),
            )
            .on("docker --version", ScriptedResponse::exit(127))
            .on("which docker", ScriptedResponse::exit(1))
            .on("sudo usermod -aG docker", ScriptedResponse::exit(1))
            .on(
                "docker images -q",
                ScriptedResponse::ok().with_stdout("a1b2c3d4e5f6\n"),
            ),
    );
    let mut sink = CaptureSink::default();

    let report = orchestrator(&session)
        .run_client(&low_alignment_spec(), &mut sink)
        .await
        .unwrap();

    assert!(report.success());
}

#[tokio::test(start_paused = true)]
async fn cleanup_is_idempotent_and_tolerates_absence() {
    let session = FakeSession::new();
    let handle = ResourceHandle::Container("ve3c-client".to_string());

    // `docker rm -f <name> || true` exits zero whether or not the name
    // exists; both calls must succeed.
    assert!(cleanup::remove(&session, &handle).await);
    assert!(cleanup::remove(&session, &handle).await);
    assert_eq!(session.count_matching("docker rm -f ve3c-client || true"), 2);
}

#[tokio::test(start_paused = true)]
async fn server_launch_publishes_ports_and_stops_on_cancel() {
    let session = Arc::new(provisioned_host().on(
        "docker logs -f",
        ScriptedResponse::ok()
            .with_stdout("server listening on 8123\n")
            .with_stdout("policy store ready\n")
            .paused(Duration::from_secs(3600)),
    ));
    let mut sink = CaptureSink::default();

    let cancel = async {
        tokio::time::sleep(Duration::from_secs(2)).await;
    };
    orchestrator(&session)
        .run_server(cancel, &mut sink)
        .await
        .unwrap();

    let commands = session.dispatched();
    assert!(commands
        .iter()
        .any(|c| c.contains("docker network create --driver bridge certifier-net")));
    assert!(commands
        .iter()
        .any(|c| c.contains("docker rm -f ve3c-server || true")));
    let launch = commands
        .iter()
        .find(|c| c.contains("docker run -d --name ve3c-server"))
        .expect("server launch command");
    assert!(launch.contains("--cpus=2 --memory=4g"));
    assert!(launch.contains("-p 8123:8123 -p 8124:8124"));
    assert!(commands.iter().any(|c| c.contains("docker logs -f ve3c-server")));
    // Cancellation stopped local monitoring; nothing was removed after.
    assert_eq!(session.count_matching("docker rm -f ve3c-server"), 1);
}
