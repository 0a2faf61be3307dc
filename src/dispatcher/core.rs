use super::handler::HandlerRef;
use super::lanes::{CpuLane, IoLane, LaneConfig, LaneMetricsSnapshot, Task};
use super::outcome::OutcomeFuture;
use crate::binder::Args;
use crate::route::WorkloadClass;
use may::sync::mpsc;
use std::io;
use std::time::Instant;
use tracing::{debug, info};

/// Runs handler invocations on the lane their route declares.
///
/// Callers get the same [`OutcomeFuture`] whichever lane ran the task.
/// Dropping the dispatcher closes the CPU lane and joins its workers after
/// queued work drains; IO lane coroutines already spawned run to completion.
pub struct Dispatcher {
    io: IoLane,
    cpu: CpuLane,
}

impl Dispatcher {
    /// Start both lanes.
    ///
    /// # Errors
    ///
    /// Fails if a CPU lane worker thread cannot be spawned.
    pub fn new(config: LaneConfig) -> io::Result<Self> {
        let cpu = CpuLane::new(config.cpu_workers)?;
        info!(
            cpu_workers = cpu.workers(),
            io_stack_size = config.io_stack_size,
            "Dispatcher started"
        );
        Ok(Self {
            io: IoLane::new(config.io_stack_size),
            cpu,
        })
    }

    /// Submit an invocation and return immediately.
    ///
    /// Never fails: a lane that cannot take the task resolves the future
    /// with a 503 failure instead.
    pub fn dispatch(&self, handler: &HandlerRef, args: Args, class: WorkloadClass) -> OutcomeFuture {
        let (reply, rx) = mpsc::channel();
        let task = Task {
            handler: HandlerRef::clone(handler),
            args,
            reply,
            enqueued: Instant::now(),
        };
        debug!(lane = class.as_str(), args = task.args.len(), "Task submitted");
        match class {
            WorkloadClass::Io => self.io.submit(task),
            WorkloadClass::Cpu => self.cpu.submit(task),
        }
        OutcomeFuture::new(rx)
    }

    #[must_use]
    pub fn metrics(&self, class: WorkloadClass) -> LaneMetricsSnapshot {
        match class {
            WorkloadClass::Io => self.io.metrics().snapshot(),
            WorkloadClass::Cpu => self.cpu.metrics().snapshot(),
        }
    }

    #[must_use]
    pub fn cpu_workers(&self) -> usize {
        self.cpu.workers()
    }
}
