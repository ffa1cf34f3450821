//! Streaming command execution
//!
//! Drives one remote command to completion while relaying its stdout and
//! stderr to local sinks as bytes arrive. Both channels are drained in the
//! same loop iteration with non-blocking reads; draining only one while
//! the remote process blocks writing to the other would deadlock it
//! against its own pipe buffer. After the remote side reports completion
//! a final drain runs both channels to EOF, since output can still be in
//! flight when the exit status settles.

use std::io::Write;
use std::time::{Duration, Instant};

use crate::session::{RemoteExecution, RemoteSession, SessionError};

/// Tick length of the cooperative polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where relayed output bytes go. Streaming is a side effect of
/// execution, not part of its result.
pub trait OutputSink: Send {
    fn stdout_chunk(&mut self, chunk: &[u8]);
    fn stderr_chunk(&mut self, chunk: &[u8]);
}

/// Pass-through sink: workload bytes go straight to this process's own
/// stdout/stderr, flushed per chunk so progress is visible in real time.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn stdout_chunk(&mut self, chunk: &[u8]) {
        let mut out = std::io::stdout();
        let _ = out.write_all(chunk);
        let _ = out.flush();
    }

    fn stderr_chunk(&mut self, chunk: &[u8]) {
        let mut err = std::io::stderr();
        let _ = err.write_all(chunk);
        let _ = err.flush();
    }
}

/// Buffering sink for presence queries and tests.
#[derive(Debug, Default)]
pub struct CaptureSink {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CaptureSink {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }
}

impl OutputSink for CaptureSink {
    fn stdout_chunk(&mut self, chunk: &[u8]) {
        self.stdout.extend_from_slice(chunk);
    }

    fn stderr_chunk(&mut self, chunk: &[u8]) {
        self.stderr.extend_from_slice(chunk);
    }
}

/// Final outcome of one streamed command. A non-zero exit status is data
/// for the caller to classify, not an executor error.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionResult {
    pub exit_status: i32,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Relay `execution` to `sink` until the remote command finishes, then
/// report its exit status and observed wall time.
pub async fn run_to_completion(
    mut execution: RemoteExecution,
    sink: &mut dyn OutputSink,
) -> ExecutionResult {
    let started = Instant::now();
    let mut exit_status = None;

    loop {
        // Symmetric non-blocking drains: both channels every tick.
        while let Some(chunk) = execution.try_next_stdout() {
            sink.stdout_chunk(&chunk);
        }
        while let Some(chunk) = execution.try_next_stderr() {
            sink.stderr_chunk(&chunk);
        }

        if exit_status.is_none() {
            exit_status = execution.poll_exit_status();
        }
        if exit_status.is_some() && execution.streams_finished() {
            break;
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }

    ExecutionResult {
        // The status is settled by the time both streams hit EOF.
        exit_status: exit_status.unwrap_or(-1),
        duration: started.elapsed(),
    }
}

/// Dispatch `command` and stream it to `sink` until completion.
pub async fn execute_streamed(
    session: &dyn RemoteSession,
    command: &str,
    interactive: bool,
    sink: &mut dyn OutputSink,
) -> Result<ExecutionResult, SessionError> {
    let execution = session.execute(command, interactive).await?;
    Ok(run_to_completion(execution, sink).await)
}

/// Dispatch `command` quietly and hand back its buffered output, for
/// short queries whose stdout the orchestrator inspects.
pub async fn execute_captured(
    session: &dyn RemoteSession,
    command: &str,
) -> Result<(ExecutionResult, CaptureSink), SessionError> {
    let mut sink = CaptureSink::default();
    let result = execute_streamed(session, command, false, &mut sink).await?;
    Ok((result, sink))
}
