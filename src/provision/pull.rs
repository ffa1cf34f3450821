//! Bounded-retry image pull
//!
//! Ensures a named image is present on the remote host before anything
//! runs from it. Presence is checked first with a cheap listing; only an
//! absent image costs pull attempts.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::docker;
use crate::error::OrchestrateError;
use crate::session::RemoteSession;
use crate::stream::{execute_captured, execute_streamed, OutputSink};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Image was already local; zero pulls issued.
    AlreadyPresent,
    Pulled { attempts: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct RetryingPuller {
    policy: RetryPolicy,
}

impl RetryingPuller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Make `image` available locally, pulling with bounded retries when
    /// it is absent. Success of each attempt is judged solely by the
    /// remote command's exit status.
    pub async fn ensure_present(
        &self,
        session: &dyn RemoteSession,
        image: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<PullOutcome, OrchestrateError> {
        let (query, captured) = execute_captured(session, &docker::image_query(image)).await?;
        if query.success() && !captured.stdout_text().trim().is_empty() {
            info!(image, "image already present, skipping pull");
            return Ok(PullOutcome::AlreadyPresent);
        }

        for attempt in 1..=self.policy.max_attempts {
            info!(image, attempt, max = self.policy.max_attempts, "pulling image");
            let result = execute_streamed(session, &docker::pull(image), false, sink).await?;
            if result.success() {
                info!(image, attempt, "image pulled");
                return Ok(PullOutcome::Pulled { attempts: attempt });
            }
            warn!(
                image,
                attempt,
                exit_status = result.exit_status,
                "pull failed"
            );
            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        Err(OrchestrateError::ImageUnavailable {
            image: image.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}
