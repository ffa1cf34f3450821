//! Remote session abstraction
//!
//! Provides the seam between the orchestrator and whatever carries its
//! commands to the target host, enabling dependency injection for testing.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

pub mod ssh;

pub use ssh::SshSession;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("SSH key file not found at: {path}")]
    KeyFileNotFound { path: String },
    #[error("SSH key file not readable: {path}")]
    KeyFileUnreadable { path: String },
    #[error("failed to reach {host}: {message}")]
    ConnectionFailure { host: String, message: String },
    #[error("failed to dispatch remote command: {message}")]
    Dispatch { message: String },
}

/// Handle for one in-flight remote command.
///
/// Stdout and stderr arrive as independently-buffered chunk streams; the
/// exit status settles asynchronously once the remote process finishes.
/// All accessors are non-blocking so a caller can drain both streams in a
/// single loop iteration without either one stalling the other.
pub struct RemoteExecution {
    stdout: mpsc::UnboundedReceiver<Vec<u8>>,
    stderr: mpsc::UnboundedReceiver<Vec<u8>>,
    exit: oneshot::Receiver<i32>,
    stdout_closed: bool,
    stderr_closed: bool,
    exit_status: Option<i32>,
}

impl RemoteExecution {
    pub fn new(
        stdout: mpsc::UnboundedReceiver<Vec<u8>>,
        stderr: mpsc::UnboundedReceiver<Vec<u8>>,
        exit: oneshot::Receiver<i32>,
    ) -> Self {
        Self {
            stdout,
            stderr,
            exit,
            stdout_closed: false,
            stderr_closed: false,
            exit_status: None,
        }
    }

    /// Next buffered stdout chunk, if any arrived since the last call.
    pub fn try_next_stdout(&mut self) -> Option<Vec<u8>> {
        match self.stdout.try_recv() {
            Ok(chunk) => Some(chunk),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.stdout_closed = true;
                None
            }
        }
    }

    /// Next buffered stderr chunk, if any arrived since the last call.
    pub fn try_next_stderr(&mut self) -> Option<Vec<u8>> {
        match self.stderr.try_recv() {
            Ok(chunk) => Some(chunk),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.stderr_closed = true;
                None
            }
        }
    }

    /// Exit status once the remote side has reported completion.
    ///
    /// Output may still be in flight when this first returns `Some`; callers
    /// must keep draining until [`streams_finished`](Self::streams_finished).
    pub fn poll_exit_status(&mut self) -> Option<i32> {
        if self.exit_status.is_none() {
            match self.exit.try_recv() {
                Ok(status) => self.exit_status = Some(status),
                Err(oneshot::error::TryRecvError::Empty) => {}
                // Sender dropped without reporting; treat like a reaped
                // process with no code, as the process layer does.
                Err(oneshot::error::TryRecvError::Closed) => self.exit_status = Some(-1),
            }
        }
        self.exit_status
    }

    /// True once both output streams have reached EOF and been drained.
    pub fn streams_finished(&self) -> bool {
        self.stdout_closed && self.stderr_closed
    }
}

/// Authenticated channel to a target host.
///
/// Implementations must support at least one in-flight command at a time.
/// Session establishment and auth are the implementation's responsibility;
/// the orchestrator only dispatches command strings and observes results.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Dispatch `command` on the remote host. `interactive` requests a pty,
    /// which some container invocations need for line-buffered output.
    async fn execute(
        &self,
        command: &str,
        interactive: bool,
    ) -> Result<RemoteExecution, SessionError>;
}
