//! Job poller tests.
//!
//! All tests run against a scripted status check and `RecordingDelay`, so no
//! network and no real waiting is involved.

use async_trait::async_trait;
use pixland_common::poller::{
    JobOperation, JobPoller, JobResponse, PollOutcome, RecordingDelay, MAX_ATTEMPTS_CEILING,
};
use pixland_common::{CancellationToken, PollerSettings};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const BASE_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq)]
struct Flaky(&'static str);

/// Replays a fixed list of statuses, then repeats the last one.
struct ScriptedStatus {
    script: Mutex<VecDeque<Result<&'static str, Flaky>>>,
    last: Result<&'static str, Flaky>,
    calls: AtomicU32,
    seen_args: Mutex<Vec<String>>,
}

impl ScriptedStatus {
    fn new(script: Vec<Result<&'static str, Flaky>>) -> Self {
        let last = script.last().cloned().unwrap_or(Ok("PENDING"));
        Self {
            script: Mutex::new(script.into()),
            last,
            calls: AtomicU32::new(0),
            seen_args: Mutex::new(Vec::new()),
        }
    }

    fn always(status: &'static str) -> Self {
        Self::new(vec![Ok(status)])
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobOperation<str> for ScriptedStatus {
    type Output = String;
    type Error = Flaky;

    async fn invoke(&self, job_id: &str) -> Result<JobResponse<String>, Flaky> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_args.lock().unwrap().push(job_id.to_string());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone());
        next.map(|status| JobResponse {
            status: status.to_string(),
            payload: format!("{}#{}", job_id, n),
        })
    }
}

fn poller(delay: RecordingDelay) -> JobPoller<RecordingDelay> {
    let settings = PollerSettings {
        base_delay_ms: BASE_MS,
        ..Default::default()
    };
    JobPoller::with_delay(&settings, delay)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test]
async fn test_complete_on_first_call() {
    let op = ScriptedStatus::always("SUCCESS");
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();

    let outcome = poller
        .poll_until_complete(&op, "job-1", 3, &cancel)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Complete {
            payload: "job-1#0".to_string(),
            attempts: 1
        }
    );
    assert_eq!(op.calls(), 1);
    assert_eq!(poller.delay().total(), Duration::ZERO);
}

#[tokio::test]
async fn test_completes_after_backoff() {
    let op = ScriptedStatus::new(vec![Ok("PENDING"), Ok("PENDING"), Ok("complete")]);
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();

    let outcome = poller
        .poll_until_complete(&op, "job-2", 5, &cancel)
        .await
        .unwrap();

    assert_eq!(outcome.attempts(), 3);
    assert_eq!(outcome.into_payload(), Some("job-2#2".to_string()));
    assert_eq!(poller.delay().recorded(), vec![ms(BASE_MS), ms(2 * BASE_MS)]);
    // Same arguments on every attempt
    assert_eq!(*op.seen_args.lock().unwrap(), vec!["job-2"; 3]);
}

#[tokio::test]
async fn test_timeout_after_max_attempts() {
    let op = ScriptedStatus::always("in-progress");
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();

    let outcome = poller
        .poll_until_complete(&op, "job-3", 3, &cancel)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Timeout {
            attempts: 4,
            max_attempts: 3,
            last_status: "in-progress".to_string()
        }
    );
    // attempts 0 through 3
    assert_eq!(op.calls(), 4);
    assert_eq!(
        poller.delay().recorded(),
        vec![ms(BASE_MS), ms(2 * BASE_MS), ms(4 * BASE_MS)]
    );
    assert_eq!(poller.delay().total(), poller.worst_case_wait(3));
    assert_eq!(poller.delay().total(), ms(BASE_MS * (8 - 1)));
}

#[tokio::test]
async fn test_zero_attempts_checks_once() {
    let op = ScriptedStatus::always("PENDING");
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();

    let outcome = poller
        .poll_until_complete(&op, "job-4", 0, &cancel)
        .await
        .unwrap();

    assert!(matches!(outcome, PollOutcome::Timeout { attempts: 1, .. }));
    assert_eq!(op.calls(), 1);
    assert!(poller.delay().recorded().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_not_retried() {
    let op = ScriptedStatus::new(vec![Ok("PENDING"), Err(Flaky("connection reset"))]);
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();

    let err = poller
        .poll_until_complete(&op, "job-5", 5, &cancel)
        .await
        .unwrap_err();

    assert_eq!(err, Flaky("connection reset"));
    assert_eq!(op.calls(), 2);
    assert_eq!(poller.delay().recorded(), vec![ms(BASE_MS)]);
}

#[tokio::test]
async fn test_cancel_during_delay_before_attempt_two() {
    let op = ScriptedStatus::always("PENDING");
    let cancel = CancellationToken::new();
    // second sleep is the one between attempt 1 and attempt 2
    let poller = poller(RecordingDelay::cancel_on_sleep(2, cancel.clone()));

    let outcome = poller
        .poll_until_complete(&op, "job-6", 5, &cancel)
        .await
        .unwrap();

    assert_eq!(outcome, PollOutcome::Cancelled { attempts: 2 });
    assert_eq!(op.calls(), 2);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let op = ScriptedStatus::always("SUCCESS");
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = poller
        .poll_until_complete(&op, "job-7", 5, &cancel)
        .await
        .unwrap();

    assert_eq!(outcome, PollOutcome::Cancelled { attempts: 0 });
    assert_eq!(op.calls(), 0);
}

#[tokio::test]
async fn test_max_attempts_ceiling() {
    let op = ScriptedStatus::always("PENDING");
    let poller = poller(RecordingDelay::new());
    let cancel = CancellationToken::new();

    let outcome = poller
        .poll_until_complete(&op, "job-8", 1_000, &cancel)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PollOutcome::Timeout {
            attempts: MAX_ATTEMPTS_CEILING + 1,
            max_attempts: MAX_ATTEMPTS_CEILING,
            last_status: "PENDING".to_string()
        }
    );
    assert_eq!(op.calls(), 17);
}

#[tokio::test(start_paused = true)]
async fn test_real_delay_cancelled_mid_sleep() {
    let settings = PollerSettings {
        base_delay_ms: BASE_MS,
        ..Default::default()
    };
    let poller = JobPoller::new(&settings);
    let op = ScriptedStatus::always("PENDING");
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(ms(BASE_MS + BASE_MS / 2)).await;
        canceller.cancel();
    });

    let outcome = poller
        .poll_until_complete(&op, "job-9", 5, &cancel)
        .await
        .unwrap();

    // first wait (3s) completes, cancelled 1.5s into the second wait (6s)
    assert_eq!(outcome, PollOutcome::Cancelled { attempts: 2 });
    assert_eq!(op.calls(), 2);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let settings = PollerSettings {
        base_delay_ms: 10,
        ..Default::default()
    };
    let fast = ScriptedStatus::always("SUCCESS");
    let slow = ScriptedStatus::new(vec![Ok("PENDING"), Ok("PENDING"), Ok("SUCCESS")]);
    let a = JobPoller::with_delay(&settings, RecordingDelay::new());
    let b = JobPoller::with_delay(&settings, RecordingDelay::new());
    let cancel = CancellationToken::new();

    let (ra, rb) = tokio::join!(
        a.poll_until_complete(&fast, "a", 5, &cancel),
        b.poll_until_complete(&slow, "b", 5, &cancel),
    );

    assert_eq!(ra.unwrap().attempts(), 1);
    assert_eq!(rb.unwrap().attempts(), 3);
    assert!(a.delay().recorded().is_empty());
    assert_eq!(b.delay().recorded(), vec![ms(10), ms(20)]);
}
