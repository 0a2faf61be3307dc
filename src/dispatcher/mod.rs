//! # Dispatcher Module
//!
//! Runs handler invocations on one of two execution lanes and hands back a
//! single-resolution [`OutcomeFuture`].
//!
//! ## Overview
//!
//! - [`Handler`] / [`HandlerRef`]: the callable bound to a route when it is
//!   registered. Nothing is resolved by name on the request path.
//! - [`Controller`]: a lazily built, memoized instance shared by the routes
//!   it owns.
//! - [`Dispatcher`]: owns the [`IoLane`] and [`CpuLane`] and routes each
//!   invocation by its [`WorkloadClass`](crate::route::WorkloadClass).
//!
//! ## Lanes
//!
//! The IO lane spawns one `may` coroutine per invocation with a configurable
//! stack size. It scales with request volume and is unbounded.
//!
//! The CPU lane is a fixed pool of OS threads sized to the available
//! parallelism. At most `cpu_workers` compute-bound handlers run at once;
//! the rest wait in its queue.
//!
//! ## Error Handling
//!
//! - Handler `Err` becomes a failure [`Outcome`] (status from [`Failure`] or 500)
//! - Handler panics are caught at the lane boundary and become 500
//! - A lane that cannot accept work resolves the future with 503
//!
//! Nothing raised by a handler propagates past the dispatcher.
//!
//! ## Example
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(LaneConfig::default())?;
//! let handler = handler_fn(|args| {
//!     Ok(json!({ "sum": args.int(0).unwrap_or(0) + args.int(1).unwrap_or(0) }))
//! });
//! let outcome = dispatcher
//!     .dispatch(&handler, args, WorkloadClass::Cpu)
//!     .wait();
//! ```

mod core;
mod handler;
mod lanes;
mod outcome;

pub use core::Dispatcher;
pub use handler::{handler_fn, Controller, Handler, HandlerRef};
pub use lanes::{
    default_cpu_workers, invoke, CpuLane, IoLane, LaneConfig, LaneMetrics, LaneMetricsSnapshot,
};
pub use outcome::{Failure, Outcome, OutcomeFuture};

pub(crate) use lanes::panic_message;
