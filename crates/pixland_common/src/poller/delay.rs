//! Delay primitive used between poll attempts.
//!
//! Production code sleeps on the tokio timer with `TokioDelay`. Tests use
//! `RecordingDelay`, which returns at once and remembers every requested
//! duration so backoff schedules can be asserted exactly.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay that does not wait, only records
#[derive(Debug, Default)]
pub struct RecordingDelay {
    slept: Mutex<Vec<Duration>>,
    cancel_on: Option<(usize, CancellationToken)>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel `token` while serving the `nth` sleep (1-based)
    pub fn cancel_on_sleep(nth: usize, token: CancellationToken) -> Self {
        Self {
            slept: Mutex::new(Vec::new()),
            cancel_on: Some((nth, token)),
        }
    }

    pub fn recorded(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn total(&self) -> Duration {
        self.recorded().iter().sum()
    }
}

#[async_trait]
impl Delay for RecordingDelay {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut slept = self
                .slept
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            slept.push(duration);
            slept.len()
        };
        if let Some((nth, token)) = &self.cancel_on {
            if count == *nth {
                token.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_delay() {
        let delay = RecordingDelay::new();
        delay.sleep(Duration::from_millis(5)).await;
        delay.sleep(Duration::from_millis(10)).await;
        assert_eq!(
            delay.recorded(),
            vec![Duration::from_millis(5), Duration::from_millis(10)]
        );
        assert_eq!(delay.total(), Duration::from_millis(15));
    }

    #[tokio::test]
    async fn test_cancel_on_sleep() {
        let token = CancellationToken::new();
        let delay = RecordingDelay::cancel_on_sleep(2, token.clone());
        delay.sleep(Duration::from_millis(1)).await;
        assert!(!token.is_cancelled());
        delay.sleep(Duration::from_millis(1)).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_delay_waits() {
        let start = tokio::time::Instant::now();
        TokioDelay.sleep(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
