//! The two execution lanes.
//!
//! - **IO lane**: one `may` coroutine per invocation. Cheap enough to scale
//!   with request volume, so it is intentionally unbounded. Backpressure for
//!   IO-style work is the transport's job.
//! - **CPU lane**: a fixed pool of named OS threads draining one shared
//!   queue. The pool size is the admission limit; excess work waits in the
//!   queue instead of competing with the coroutine scheduler.
//!
//! Both lanes run the handler under `catch_unwind` and always reply with an
//! [`Outcome`].

use super::handler::HandlerRef;
use super::outcome::Outcome;
use crate::binder::Args;
use crate::error::DispatchError;
use crate::route::WorkloadClass;
use may::sync::{mpmc, mpsc};
use std::any::Any;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Sizing for both lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneConfig {
    /// CPU lane worker threads (minimum 1)
    pub cpu_workers: usize,
    /// Stack size for IO lane coroutines
    pub io_stack_size: usize,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            cpu_workers: default_cpu_workers(),
            io_stack_size: 0x10000,
        }
    }
}

/// Available parallelism, or 1 when it cannot be determined.
#[must_use]
pub fn default_cpu_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Counters for one lane.
#[derive(Debug, Default)]
pub struct LaneMetrics {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

/// Point-in-time copy of [`LaneMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneMetricsSnapshot {
    pub submitted: u64,
    pub completed: u64,
    /// Completed with a failure outcome (error, panic or spawn failure)
    pub failed: u64,
    /// Invocations executing right now
    pub in_flight: usize,
    /// Highest `in_flight` ever observed
    pub peak_in_flight: usize,
}

impl LaneMetricsSnapshot {
    /// Submitted but not yet started.
    #[must_use]
    pub fn queued(&self) -> u64 {
        self.submitted
            .saturating_sub(self.completed)
            .saturating_sub(self.in_flight as u64)
    }
}

impl LaneMetrics {
    fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_start(&self) {
        let now = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_running.fetch_max(now, Ordering::AcqRel);
    }

    fn record_finish(&self, ok: bool) {
        self.running.fetch_sub(1, Ordering::AcqRel);
        self.record_done(ok);
    }

    fn record_done(&self, ok: bool) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> LaneMetricsSnapshot {
        LaneMetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_flight: self.running.load(Ordering::Acquire),
            peak_in_flight: self.peak_running.load(Ordering::Acquire),
        }
    }
}

/// Text of a `panic!` payload, if it carries one.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<String> {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
}

/// Run a handler, converting errors and panics into a failure outcome.
pub fn invoke(handler: &HandlerRef, args: &Args) -> Outcome {
    match catch_unwind(AssertUnwindSafe(|| handler.call(args))) {
        Ok(result) => Outcome::from_result(result),
        Err(panic) => {
            let panic_message =
                panic_message(panic.as_ref()).unwrap_or_else(|| "unknown panic payload".to_string());
            error!(panic_message = %panic_message, "Handler panicked - CRITICAL");
            Outcome::Failure(
                DispatchError::HandlerFailure(format!("Handler panicked: {panic_message}")).into(),
            )
        }
    }
}

/// One queued invocation.
pub(crate) struct Task {
    pub(crate) handler: HandlerRef,
    pub(crate) args: Args,
    pub(crate) reply: mpsc::Sender<Outcome>,
    pub(crate) enqueued: Instant,
}

impl Task {
    fn run(self, class: WorkloadClass, metrics: &LaneMetrics) {
        metrics.record_start();
        let queue_us = self.enqueued.elapsed().as_micros();
        let started = Instant::now();

        let outcome = invoke(&self.handler, &self.args);

        metrics.record_finish(!outcome.is_failure());
        debug!(
            lane = class.as_str(),
            queue_us = queue_us,
            execution_us = started.elapsed().as_micros(),
            status = outcome.status(),
            "Lane task complete"
        );
        if self.reply.send(outcome).is_err() {
            debug!(lane = class.as_str(), "Caller gone, outcome discarded");
        }
    }
}

/// Coroutine-per-invocation lane.
pub struct IoLane {
    stack_size: usize,
    metrics: Arc<LaneMetrics>,
}

impl IoLane {
    #[must_use]
    pub fn new(stack_size: usize) -> Self {
        Self {
            stack_size,
            metrics: Arc::new(LaneMetrics::default()),
        }
    }

    pub(crate) fn submit(&self, task: Task) {
        self.metrics.record_submit();
        let fallback = task.reply.clone();
        let metrics = Arc::clone(&self.metrics);

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
        // The closure owns everything it touches (Send + 'static) and never
        // accesses thread-local state that a coroutine migration could break.
        let spawned = unsafe {
            may::coroutine::Builder::new()
                .stack_size(self.stack_size)
                .spawn(move || task.run(WorkloadClass::Io, &metrics))
        };

        if let Err(e) = spawned {
            error!(
                error = %e,
                stack_size = self.stack_size,
                "Failed to spawn IO lane coroutine"
            );
            self.metrics.record_done(false);
            let _ = fallback.send(Outcome::Failure(
                DispatchError::LaneUnavailable {
                    lane: WorkloadClass::Io.as_str(),
                    reason: e.to_string(),
                }
                .into(),
            ));
        }
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<LaneMetrics> {
        &self.metrics
    }
}

/// Fixed-size OS thread pool lane.
pub struct CpuLane {
    sender: Option<mpmc::Sender<Task>>,
    workers: Vec<thread::JoinHandle<()>>,
    metrics: Arc<LaneMetrics>,
}

impl CpuLane {
    /// Spawn `workers` threads (at least one) named `laneway-cpu-{n}`.
    pub fn new(workers: usize) -> io::Result<Self> {
        let workers = workers.max(1);
        let (tx, rx) = mpmc::channel::<Task>();
        let metrics = Arc::new(LaneMetrics::default());

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let rx = rx.clone();
            let metrics = Arc::clone(&metrics);
            let handle = thread::Builder::new()
                .name(format!("laneway-cpu-{worker_id}"))
                .spawn(move || {
                    debug!(worker_id = worker_id, "CPU lane worker started");
                    // Workers compete on one queue and exit once the sender is gone
                    // and the queue is drained.
                    while let Ok(task) = rx.recv() {
                        task.run(WorkloadClass::Cpu, &metrics);
                    }
                    debug!(worker_id = worker_id, "CPU lane worker exiting");
                })?;
            handles.push(handle);
        }

        info!(workers = workers, "CPU lane started");
        Ok(Self {
            sender: Some(tx),
            workers: handles,
            metrics,
        })
    }

    pub(crate) fn submit(&self, task: Task) {
        self.metrics.record_submit();
        let fallback = task.reply.clone();
        let sent = match &self.sender {
            Some(tx) => tx.send(task).is_ok(),
            None => false,
        };
        if sent {
            debug!(queued = self.metrics.snapshot().queued(), "Task queued on CPU lane");
        } else {
            warn!("CPU lane queue closed, rejecting task");
            self.metrics.record_done(false);
            let _ = fallback.send(Outcome::Failure(
                DispatchError::LaneUnavailable {
                    lane: WorkloadClass::Cpu.as_str(),
                    reason: "queue closed".to_string(),
                }
                .into(),
            ));
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<LaneMetrics> {
        &self.metrics
    }
}

impl Drop for CpuLane {
    fn drop(&mut self) {
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("CPU lane worker exited by panic");
            }
        }
        debug!("CPU lane stopped");
    }
}
