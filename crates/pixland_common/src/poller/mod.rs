//! Job Poller
//!
//! Drives a server-side job (image generation) to completion by asking for
//! its status until it reports a terminal-success tag.
//!
//! ## Attempt schedule
//!
//! - Attempt `d` (starting at 0) invokes the status check once
//! - A non-terminal status at `d == max_attempts` ends in `Timeout`
//! - Otherwise the poller waits `base_delay * 2^d` and tries again
//!
//! Transport errors from the status check are returned as-is and never
//! retried here. Cancellation is observed at the delay boundary only; a
//! status check already in flight is allowed to finish.

pub mod delay;
pub mod http;

pub use delay::{Delay, RecordingDelay, TokioDelay};
pub use http::{HttpJobStatus, TransportError};

use crate::config::PollerSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Hard ceiling on attempts regardless of what a caller asks for
pub const MAX_ATTEMPTS_CEILING: u32 = 16;

/// What a status check returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResponse<T> {
    pub status: String,
    pub payload: T,
}

/// Status-check capability supplied by the transport layer
#[async_trait]
pub trait JobOperation<A: Sync + ?Sized>: Send + Sync {
    type Output: Send;
    type Error: Send;

    async fn invoke(&self, args: &A) -> Result<JobResponse<Self::Output>, Self::Error>;
}

/// How a polling session ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum PollOutcome<T> {
    Complete { payload: T, attempts: u32 },
    /// Gave up with the job still running. `max_attempts` is the budget
    /// actually applied, after the ceiling.
    Timeout {
        attempts: u32,
        max_attempts: u32,
        last_status: String,
    },
    Cancelled { attempts: u32 },
}

impl<T> PollOutcome<T> {
    /// Number of status checks performed
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Complete { attempts, .. }
            | PollOutcome::Timeout { attempts, .. }
            | PollOutcome::Cancelled { attempts } => *attempts,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, PollOutcome::Complete { .. })
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            PollOutcome::Complete { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Bounded exponential-backoff poller
pub struct JobPoller<D: Delay = TokioDelay> {
    base_delay: Duration,
    complete_statuses: Vec<String>,
    delay: D,
}

impl JobPoller<TokioDelay> {
    pub fn new(settings: &PollerSettings) -> Self {
        Self::with_delay(settings, TokioDelay)
    }
}

impl<D: Delay> JobPoller<D> {
    pub fn with_delay(settings: &PollerSettings, delay: D) -> Self {
        if settings.base_delay_was_clamped() {
            warn!(
                requested_ms = settings.base_delay_ms,
                effective_ms = settings.effective_base_delay().as_millis() as u64,
                "poller base delay clamped"
            );
        }
        Self {
            base_delay: settings.effective_base_delay(),
            complete_statuses: settings.complete_statuses.clone(),
            delay,
        }
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn is_complete_status(&self, status: &str) -> bool {
        self.complete_statuses
            .iter()
            .any(|s| s.eq_ignore_ascii_case(status))
    }

    /// Wait before the attempt after `depth`: `base_delay * 2^depth`
    pub fn backoff(&self, depth: u32) -> Duration {
        let factor = 1u32.checked_shl(depth).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Longest total wait before a `Timeout` with this many attempts
    pub fn worst_case_wait(&self, max_attempts: u32) -> Duration {
        (0..max_attempts.min(MAX_ATTEMPTS_CEILING))
            .map(|depth| self.backoff(depth))
            .sum()
    }

    pub async fn poll_until_complete<A, O>(
        &self,
        operation: &O,
        args: &A,
        max_attempts: u32,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome<O::Output>, O::Error>
    where
        A: Sync + ?Sized,
        O: JobOperation<A>,
    {
        if max_attempts > MAX_ATTEMPTS_CEILING {
            warn!(
                requested = max_attempts,
                ceiling = MAX_ATTEMPTS_CEILING,
                "max attempts capped"
            );
        }
        let max_attempts = max_attempts.min(MAX_ATTEMPTS_CEILING);
        let mut depth: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                warn!(attempts = depth, "job polling cancelled");
                return Ok(PollOutcome::Cancelled { attempts: depth });
            }

            let response = operation.invoke(args).await?;
            let attempts = depth + 1;

            if self.is_complete_status(&response.status) {
                info!(attempts, status = %response.status, "job complete");
                return Ok(PollOutcome::Complete {
                    payload: response.payload,
                    attempts,
                });
            }

            if depth >= max_attempts {
                warn!(attempts, status = %response.status, "job polling timed out");
                return Ok(PollOutcome::Timeout {
                    attempts,
                    max_attempts,
                    last_status: response.status,
                });
            }

            let wait = self.backoff(depth);
            debug!(
                attempt = depth,
                status = %response.status,
                wait_ms = wait.as_millis() as u64,
                "job not finished, backing off"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(attempts, "job polling cancelled during backoff");
                    return Ok(PollOutcome::Cancelled { attempts });
                }
                _ = self.delay.sleep(wait) => {}
            }

            depth += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_delay_ms: u64) -> PollerSettings {
        PollerSettings {
            base_delay_ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let poller = JobPoller::with_delay(&settings(3000), RecordingDelay::new());
        assert_eq!(poller.backoff(0), Duration::from_millis(3000));
        assert_eq!(poller.backoff(1), Duration::from_millis(6000));
        assert_eq!(poller.backoff(2), Duration::from_millis(12000));
        assert_eq!(poller.backoff(40), Duration::from_millis(3000) * u32::MAX);
    }

    #[test]
    fn test_clamped_base_delay_is_applied() {
        let poller = JobPoller::with_delay(&settings(1), RecordingDelay::new());
        assert_eq!(poller.backoff(0), Duration::from_millis(10));

        let poller = JobPoller::with_delay(&settings(600_000), RecordingDelay::new());
        assert_eq!(poller.backoff(0), Duration::from_millis(60_000));
    }

    #[test]
    fn test_worst_case_wait() {
        let poller = JobPoller::with_delay(&settings(3000), RecordingDelay::new());
        assert_eq!(poller.worst_case_wait(0), Duration::ZERO);
        assert_eq!(poller.worst_case_wait(3), Duration::from_millis(3000 * 7));
    }

    #[test]
    fn test_complete_status_match() {
        let poller = JobPoller::with_delay(&settings(3000), RecordingDelay::new());
        assert!(poller.is_complete_status("SUCCESS"));
        assert!(poller.is_complete_status("complete"));
        assert!(!poller.is_complete_status("in-progress"));
    }

    #[test]
    fn test_outcome_accessors() {
        let done: PollOutcome<u8> = PollOutcome::Complete {
            payload: 7,
            attempts: 2,
        };
        assert!(done.is_complete());
        assert_eq!(done.attempts(), 2);
        assert_eq!(done.into_payload(), Some(7));

        let gave_up: PollOutcome<u8> = PollOutcome::Timeout {
            attempts: 4,
            max_attempts: 3,
            last_status: "PENDING".to_string(),
        };
        assert!(!gave_up.is_complete());
        assert_eq!(gave_up.into_payload(), None);
    }
}
