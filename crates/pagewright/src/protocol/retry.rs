// Retry engine - bounded polling until a predicate holds
//
// One run re-executes its thunk until the predicate accepts the result or the
// budget is spent. Recoverable errors (NotFound, NotActionable,
// AssertionFailed) are swallowed and remembered; anything else ends the run at
// once. Sleeps are clamped to the remaining budget and every attempt is itself
// bounded by it, so a run never outlives its timeout by more than one poll of
// the attempt future.

use crate::api::SessionOptions;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Floor for the polling interval; a zero interval would spin
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Timeout and polling interval of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SessionOptions::default())
    }
}

impl From<&SessionOptions> for RetryPolicy {
    fn from(options: &SessionOptions) -> Self {
        Self::new(options.timeout(), options.poll_interval())
    }
}

/// State of a retry run
///
/// `Pending -> Evaluating -> {Succeeded, Retrying -> Evaluating, TimedOut,
/// Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    Pending,
    Evaluating,
    Retrying,
    Succeeded,
    TimedOut,
    /// Ended by a non-recoverable error
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::TimedOut | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Pending => "pending",
            RunState::Evaluating => "evaluating",
            RunState::Retrying => "retrying",
            RunState::Succeeded => "succeeded",
            RunState::TimedOut => "timed out",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A single retry run
///
/// # Example
///
/// ```ignore
/// let mut run = RetryRun::new(RetryPolicy::default());
/// let count = run
///     .until(|| async { count_rows().await }, |n| {
///         if *n == 6 { Ok(()) } else { Err(Error::AssertionFailed(format!("{} rows", n))) }
///     })
///     .await?;
/// assert_eq!(run.state(), RunState::Succeeded);
/// ```
#[derive(Debug)]
pub struct RetryRun {
    policy: RetryPolicy,
    state: RunState,
    attempts: u32,
}

impl RetryRun {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RunState::Pending,
            attempts: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn transition(&mut self, state: RunState) {
        tracing::trace!(from = %self.state, to = %state, attempts = self.attempts, "retry state");
        self.state = state;
    }

    /// Re-executes `thunk` until it yields `Ok`
    pub async fn run<T, F, Fut>(&mut self, thunk: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.until(thunk, |_| Ok(())).await
    }

    /// Re-executes `thunk` until `predicate` accepts its result
    pub async fn until<T, F, Fut, P>(&mut self, mut thunk: F, predicate: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&T) -> Result<()>,
    {
        if self.state != RunState::Pending {
            return Err(Error::InvalidArgument(format!(
                "retry run already {}",
                self.state
            )));
        }

        let start = Instant::now();
        let deadline = start + self.policy.timeout;
        let interval = self.policy.interval.max(MIN_POLL_INTERVAL);
        self.transition(RunState::Evaluating);

        loop {
            self.attempts += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let outcome = match tokio::time::timeout(remaining, thunk()).await {
                Ok(result) => result.and_then(|value| predicate(&value).map(|()| value)),
                Err(_) => Err(Error::AssertionFailed(format!(
                    "attempt {} did not finish within the remaining {:?}",
                    self.attempts, remaining
                ))),
            };

            let last = match outcome {
                Ok(value) => {
                    self.transition(RunState::Succeeded);
                    return Ok(value);
                }
                Err(e) if e.is_recoverable() => e,
                Err(e) => {
                    self.transition(RunState::Failed);
                    return Err(e);
                }
            };
            tracing::trace!(attempt = self.attempts, error = %last, "attempt failed");

            let now = Instant::now();
            if now >= deadline {
                self.transition(RunState::TimedOut);
                return Err(Error::Timeout {
                    elapsed: now - start,
                    attempts: self.attempts,
                    last: Box::new(last),
                });
            }

            self.transition(RunState::Retrying);
            tokio::time::sleep(interval.min(deadline - now)).await;
            self.transition(RunState::Evaluating);
        }
    }
}

/// Re-executes `thunk` until `predicate` accepts its result or `policy`
/// runs out.
pub async fn retry_until<T, F, Fut, P>(policy: RetryPolicy, thunk: F, predicate: P) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> Result<()>,
{
    RetryRun::new(policy).until(thunk, predicate).await
}
