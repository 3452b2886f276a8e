//! Waiting on remote, stateful jobs ("runs").
//!
//! Hosted assistant APIs process a request asynchronously and expose its
//! progress as a status string. [`wait_for_run`] drives a
//! [`RunSource`] through the states
//! `Queued → InProgress → {Completed | Failed | Cancelled | Expired}` with
//! bounded exponential backoff and an overall deadline.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{ModelError, Result};

/// The lifecycle state of a remote run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    /// The run failed; carries the remote reason when one was given.
    Failed(String),
    Cancelled,
    Expired,
}

impl RunStatus {
    /// Whether the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Queued => f.write_str("queued"),
            RunStatus::InProgress => f.write_str("in_progress"),
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::Failed(reason) if reason.is_empty() => f.write_str("failed"),
            RunStatus::Failed(reason) => write!(f, "failed ({reason})"),
            RunStatus::Cancelled => f.write_str("cancelled"),
            RunStatus::Expired => f.write_str("expired"),
        }
    }
}

/// Parses the status strings used by hosted assistant APIs.
///
/// `cancelling` and `requires_action` are treated as still in progress.
impl FromStr for RunStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "queued" => Ok(RunStatus::Queued),
            "in_progress" | "cancelling" | "requires_action" => Ok(RunStatus::InProgress),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed(String::new())),
            "cancelled" => Ok(RunStatus::Cancelled),
            "expired" => Ok(RunStatus::Expired),
            other => Err(ModelError::InvalidStatus(other.to_string())),
        }
    }
}

/// Remote collaborator that reports the status of a run.
#[async_trait]
pub trait RunSource: Send + Sync {
    async fn status(&self, run_id: &str) -> Result<RunStatus>;
}

/// Backoff and deadline settings for [`wait_for_run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second poll.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor applied to the delay after every poll.
    pub multiplier: f64,
    /// Total time allowed before giving up with [`ModelError::Timeout`].
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            deadline: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    fn next_delay(&self, current: Duration) -> Duration {
        let secs = current.as_secs_f64() * self.multiplier.max(1.0);
        Duration::try_from_secs_f64(secs).map_or(self.max_delay, |next| next.min(self.max_delay))
    }
}

/// Poll `source` until `run_id` reaches a terminal state.
///
/// Returns `Ok(RunStatus::Completed)` on success. Any other terminal state
/// yields [`ModelError::RunFailed`]; exceeding `policy.deadline`, including
/// while a status call is outstanding, yields [`ModelError::Timeout`].
pub async fn wait_for_run(
    source: &dyn RunSource,
    run_id: &str,
    policy: &PollPolicy,
) -> Result<RunStatus> {
    let started = Instant::now();
    let mut delay = policy.initial_delay;
    let mut polls = 0u32;

    loop {
        let remaining = policy.deadline.saturating_sub(started.elapsed());
        let status = match tokio::time::timeout(remaining, source.status(run_id)).await {
            Ok(status) => status?,
            Err(_) => return Err(deadline_exceeded(run_id, policy, polls)),
        };
        polls += 1;
        debug!(run_id, %status, polls, "polled run status");

        match status {
            RunStatus::Completed => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                info!(run_id, polls, elapsed_ms, "run completed");
                return Ok(RunStatus::Completed);
            }
            terminal if terminal.is_terminal() => {
                warn!(run_id, status = %terminal, "run ended without completing");
                return Err(ModelError::RunFailed {
                    run_id: run_id.to_string(),
                    status: terminal.to_string(),
                });
            }
            _ => {}
        }

        let remaining = policy.deadline.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(deadline_exceeded(run_id, policy, polls));
        }
        tokio::time::sleep(delay.min(remaining)).await;
        delay = policy.next_delay(delay);
    }
}

fn deadline_exceeded(run_id: &str, policy: &PollPolicy, polls: u32) -> ModelError {
    warn!(run_id, polls, deadline_ms = policy.deadline.as_millis() as u64, "run deadline exceeded");
    ModelError::Timeout(format!("run '{run_id}' did not finish within {:?}", policy.deadline))
}
