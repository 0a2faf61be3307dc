use crate::error::DispatchError;
use may::sync::mpsc;
use serde_json::Value;
use std::sync::mpsc::TryRecvError;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure with an explicit HTTP status.
///
/// Handlers can return this (through `anyhow`) to pick a status other than
/// 500: `return Err(Failure::new(404, "no such user").into())`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Failure {
    pub status: u16,
    pub message: String,
}

impl Failure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<DispatchError> for Failure {
    fn from(err: DispatchError) -> Self {
        Self::new(err.status(), err.to_string())
    }
}

/// Result of one handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Value),
    Failure(Failure),
}

impl Outcome {
    /// Convert a handler result.
    ///
    /// An error whose root is a [`Failure`] keeps its status. Anything else is
    /// a 500 carrying the full error chain as its message.
    pub fn from_result(result: anyhow::Result<Value>) -> Self {
        match result {
            Ok(value) => Outcome::Value(value),
            Err(err) => match err.downcast_ref::<Failure>() {
                Some(failure) => Outcome::Failure(failure.clone()),
                None => Outcome::Failure(DispatchError::HandlerFailure(format!("{err:#}")).into()),
            },
        }
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Status the outcome will be assembled with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Value(_) => 200,
            Outcome::Failure(f) => f.status,
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Failure(failure)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(1);

fn abandoned() -> Outcome {
    Outcome::Failure(
        DispatchError::HandlerFailure("handler task ended without producing an outcome".to_string())
            .into(),
    )
}

/// Single-resolution handle on a dispatched invocation.
///
/// The lane writes exactly one [`Outcome`]; this handle hands it out at
/// most once. Waiting suspends the current coroutine (or blocks the thread
/// outside the coroutine runtime). Dropping the handle before the outcome
/// arrives lets the task finish and discards its result.
pub struct OutcomeFuture {
    rx: Option<mpsc::Receiver<Outcome>>,
}

impl OutcomeFuture {
    pub(crate) fn new(rx: mpsc::Receiver<Outcome>) -> Self {
        Self { rx: Some(rx) }
    }

    /// An already-resolved future.
    #[must_use]
    pub fn ready(outcome: Outcome) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(outcome);
        Self::new(rx)
    }

    /// Wait for the outcome.
    ///
    /// A task that dies without replying resolves as a 500 failure.
    /// Returns that same failure if the outcome was already taken.
    pub fn wait(mut self) -> Outcome {
        match self.rx.take() {
            Some(rx) => rx.recv().unwrap_or_else(|_| abandoned()),
            None => abandoned(),
        }
    }

    /// Non-blocking poll. `Some` at most once.
    pub fn try_take(&mut self) -> Option<Outcome> {
        let result = match self.rx.as_ref()?.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => abandoned(),
        };
        self.rx = None;
        Some(result)
    }

    /// Wait at most `timeout`.
    ///
    /// `None` on expiry. The in-flight task is not interrupted; its outcome
    /// is dropped when it completes.
    pub fn wait_timeout(mut self, timeout: Duration) -> Option<Outcome> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(outcome) = self.try_take() {
                return Some(outcome);
            }
            if self.rx.is_none() {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            may::coroutine::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    /// Whether the outcome has been handed out.
    #[must_use]
    pub fn is_taken(&self) -> bool {
        self.rx.is_none()
    }
}
