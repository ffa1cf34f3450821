//! Shared test fixtures: a scripted in-memory remote session.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use ve3c_control::session::{RemoteExecution, RemoteSession, SessionError};

/// Canned reply for one dispatched command.
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub stdout: Vec<Vec<u8>>,
    pub stderr: Vec<Vec<u8>>,
    pub exit_status: i32,
    /// When set, chunks are delivered one at a time with this pause in
    /// between, simulating a writer that stalls mid-burst.
    pub pause_between_chunks: Option<Duration>,
}

impl ScriptedResponse {
    pub fn ok() -> Self {
        Self::exit(0)
    }

    pub fn exit(exit_status: i32) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_status,
            pause_between_chunks: None,
        }
    }

    pub fn with_stdout(mut self, text: &str) -> Self {
        self.stdout.push(text.as_bytes().to_vec());
        self
    }

    pub fn with_stderr(mut self, text: &str) -> Self {
        self.stderr.push(text.as_bytes().to_vec());
        self
    }

    pub fn paused(mut self, pause: Duration) -> Self {
        self.pause_between_chunks = Some(pause);
        self
    }
}

struct Rule {
    pattern: String,
    responses: VecDeque<ScriptedResponse>,
}

/// Scripted [`RemoteSession`]: matches dispatched commands against
/// substring rules in registration order and replies from each rule's
/// queue (the last queued response repeats). Unmatched commands succeed
/// silently, which keeps provisioning plumbing out of each test's script.
#[derive(Default)]
pub struct FakeSession {
    rules: Mutex<Vec<Rule>>,
    commands: Mutex<Vec<String>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `response` for commands containing `pattern`.
    pub fn on(self, pattern: &str, response: ScriptedResponse) -> Self {
        {
            let mut rules = self.rules.lock().unwrap();
            if let Some(rule) = rules.iter_mut().find(|r| r.pattern == pattern) {
                rule.responses.push_back(response);
            } else {
                rules.push(Rule {
                    pattern: pattern.to_string(),
                    responses: VecDeque::from([response]),
                });
            }
        }
        self
    }

    /// Every command dispatched so far, in order.
    pub fn dispatched(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(pattern))
            .count()
    }

    fn response_for(&self, command: &str) -> ScriptedResponse {
        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if command.contains(&rule.pattern) {
                return if rule.responses.len() > 1 {
                    rule.responses.pop_front().unwrap()
                } else {
                    rule.responses
                        .front()
                        .cloned()
                        .unwrap_or_else(ScriptedResponse::ok)
                };
            }
        }
        ScriptedResponse::ok()
    }
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn execute(
        &self,
        command: &str,
        _interactive: bool,
    ) -> Result<RemoteExecution, SessionError> {
        self.commands.lock().unwrap().push(command.to_string());
        let response = self.response_for(command);

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        if let Some(pause) = response.pause_between_chunks {
            tokio::spawn(async move {
                let rounds = response.stdout.len().max(response.stderr.len());
                for i in 0..rounds {
                    if let Some(chunk) = response.stdout.get(i) {
                        let _ = out_tx.send(chunk.clone());
                    }
                    tokio::time::sleep(pause).await;
                    if let Some(chunk) = response.stderr.get(i) {
                        let _ = err_tx.send(chunk.clone());
                    }
                    tokio::time::sleep(pause).await;
                }
                drop(out_tx);
                drop(err_tx);
                let _ = exit_tx.send(response.exit_status);
            });
        } else {
            for chunk in response.stdout {
                let _ = out_tx.send(chunk);
            }
            for chunk in response.stderr {
                let _ = err_tx.send(chunk);
            }
            drop(out_tx);
            drop(err_tx);
            let _ = exit_tx.send(response.exit_status);
        }

        Ok(RemoteExecution::new(out_rx, err_rx, exit_rx))
    }
}

/// Standard script for a host that already has Docker and the images.
pub fn provisioned_host() -> FakeSession {
    FakeSession::new()
        .on(
            "docker --version",
            ScriptedResponse::ok().with_stdout("Docker version 24.0.7, build afdd53b\n"),
        )
        .on(
            "docker images -q",
            ScriptedResponse::ok().with_stdout("a1b2c3d4e5f6\n"),
        )
}
