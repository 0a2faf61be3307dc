//! Per-request pipeline.
//!
//! `RESOLVING -> BINDING -> DISPATCHING -> ASSEMBLING -> DONE`, with a direct
//! edge from any earlier phase to `ASSEMBLING` carrying a failure. Resolving
//! and binding run synchronously on the caller; dispatch returns at once and
//! assembly happens when the caller waits on the [`PendingResponse`].

use super::request::RequestContext;
use super::response::{HttpReply, ResponseAssembler};
use crate::binder::Binder;
use crate::codec::{Codec, JsonCodec};
use crate::dispatcher::{Dispatcher, Failure, Outcome, OutcomeFuture};
use crate::error::DispatchError;
use crate::ids::RequestId;
use crate::router::RouteTable;
use http::Method;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Request lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Resolving,
    Binding,
    Dispatching,
    Assembling,
    Done,
}

impl Phase {
    /// Forward by one step, or from any pre-assembly phase straight to
    /// `Assembling`. Nothing leaves `Done`.
    #[must_use]
    pub fn can_advance_to(self, next: Phase) -> bool {
        match (self, next) {
            (Phase::Done, _) => false,
            (current, Phase::Assembling) => current < Phase::Assembling,
            (Phase::Resolving, Phase::Binding)
            | (Phase::Binding, Phase::Dispatching)
            | (Phase::Assembling, Phase::Done) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Progress {
    phase: Phase,
    request_id: RequestId,
}

impl Progress {
    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(request_id = %self.request_id, from = ?self.phase, to = ?next, "Phase transition");
        self.phase = next;
    }
}

/// Requests seen by a [`DispatchService`] and its clones.
#[derive(Debug, Default)]
struct RequestCounters {
    total: AtomicU64,
    active: AtomicUsize,
}

/// Point-in-time request counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestStats {
    /// Requests accepted since startup
    pub total: u64,
    /// Requests not yet assembled or dropped
    pub active: usize,
}

/// Holds one `active` slot until the request is finished or abandoned.
struct ActiveRequest(Arc<RequestCounters>);

impl ActiveRequest {
    fn enter(counters: &Arc<RequestCounters>) -> (Self, u64) {
        let number = counters.total.fetch_add(1, Ordering::Relaxed) + 1;
        counters.active.fetch_add(1, Ordering::AcqRel);
        (Self(Arc::clone(counters)), number)
    }
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::AcqRel);
    }
}

enum Pending {
    Ready(Outcome),
    Dispatched(OutcomeFuture),
}

struct RequestMeta {
    progress: Progress,
    assembler: ResponseAssembler,
    method: Method,
    path: String,
    handler_name: Option<String>,
    started: Instant,
    request_number: u64,
    _active: ActiveRequest,
}

impl RequestMeta {
    fn finish(mut self, outcome: Outcome) -> HttpReply {
        if self.progress.phase != Phase::Assembling {
            self.progress.advance(Phase::Assembling);
        }
        let reply = self.assembler.assemble(outcome);
        self.progress.advance(Phase::Done);
        info!(
            request_id = %self.progress.request_id,
            request_number = self.request_number,
            method = %self.method,
            path = %self.path,
            handler_name = ?self.handler_name,
            status = reply.status,
            body_bytes = reply.body.len(),
            latency_ms = self.started.elapsed().as_millis() as u64,
            "Request complete"
        );
        reply
    }
}

/// A request past dispatch, waiting to be assembled.
pub struct PendingResponse {
    pending: Pending,
    meta: RequestMeta,
}

impl PendingResponse {
    /// Phase the request is in: `Dispatching` while a handler may still be
    /// running, `Assembling` when a failure short-circuited it.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.meta.progress.phase
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.meta.progress.request_id
    }

    /// Wait for the outcome and assemble the reply.
    pub fn wait(self) -> HttpReply {
        let outcome = match self.pending {
            Pending::Ready(outcome) => outcome,
            Pending::Dispatched(future) => future.wait(),
        };
        self.meta.finish(outcome)
    }

    /// Like [`wait`](Self::wait), but answers 504 after `timeout`.
    ///
    /// The handler keeps running to completion; its outcome is discarded.
    pub fn wait_timeout(self, timeout: Duration) -> HttpReply {
        let meta = self.meta;
        let outcome = match self.pending {
            Pending::Ready(outcome) => outcome,
            Pending::Dispatched(future) => match future.wait_timeout(timeout) {
                Some(outcome) => outcome,
                None => {
                    warn!(
                        request_id = %meta.progress.request_id,
                        handler_name = ?meta.handler_name,
                        timeout_ms = timeout.as_millis() as u64,
                        "Request timed out, discarding handler outcome"
                    );
                    Outcome::Failure(Failure::from(DispatchError::Timeout {
                        method: meta.method.clone(),
                        path: meta.path.clone(),
                    }))
                }
            },
        };
        meta.finish(outcome)
    }
}

/// Route table, binder, dispatcher and assembler wired into one pipeline.
///
/// Cheap to clone; every clone shares the same table and lanes.
#[derive(Clone)]
pub struct DispatchService {
    table: Arc<RouteTable>,
    binder: Binder,
    dispatcher: Arc<Dispatcher>,
    assembler: ResponseAssembler,
    counters: Arc<RequestCounters>,
}

impl DispatchService {
    #[must_use]
    pub fn new(table: Arc<RouteTable>, dispatcher: Arc<Dispatcher>, codec: Arc<dyn Codec>) -> Self {
        Self {
            table,
            binder: Binder::new(Arc::clone(&codec)),
            dispatcher,
            assembler: ResponseAssembler::new(codec),
            counters: Arc::new(RequestCounters::default()),
        }
    }

    /// Pipeline using [`JsonCodec`].
    #[must_use]
    pub fn with_json(table: Arc<RouteTable>, dispatcher: Arc<Dispatcher>) -> Self {
        Self::new(table, dispatcher, Arc::new(JsonCodec))
    }

    #[must_use]
    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.table
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn assembler(&self) -> &ResponseAssembler {
        &self.assembler
    }

    /// Request counts shared by every clone of this service.
    #[must_use]
    pub fn stats(&self) -> RequestStats {
        RequestStats {
            total: self.counters.total.load(Ordering::Relaxed),
            active: self.counters.active.load(Ordering::Acquire),
        }
    }

    /// Resolve, bind and dispatch. Returns without waiting for the handler.
    pub fn handle(&self, mut ctx: RequestContext) -> PendingResponse {
        let started = Instant::now();
        let mut progress = Progress {
            phase: Phase::Resolving,
            request_id: ctx.request_id,
        };

        let Some(route_match) = self.table.lookup(&ctx.method, &ctx.path) else {
            let err = DispatchError::RouteNotFound {
                method: ctx.method.to_string(),
                path: ctx.path.clone(),
            };
            debug!(request_id = %ctx.request_id, error = %err, "No route for request");
            progress.advance(Phase::Assembling);
            return self.pending(Pending::Ready(Outcome::Failure(err.into())), progress, ctx, None, started);
        };
        ctx.path_params = route_match.path_params_map();
        let route = route_match.route;

        progress.advance(Phase::Binding);
        let args = match self.binder.bind(&route.parameters, &ctx) {
            Ok(args) => args,
            Err(e) => {
                warn!(
                    request_id = %ctx.request_id,
                    handler_name = %route.handler_name,
                    error = %e,
                    "Parameter binding failed"
                );
                progress.advance(Phase::Assembling);
                let failure = Failure::from(DispatchError::Binding(e));
                return self.pending(
                    Pending::Ready(Outcome::Failure(failure)),
                    progress,
                    ctx,
                    Some(route.handler_name.clone()),
                    started,
                );
            }
        };

        progress.advance(Phase::Dispatching);
        info!(
            request_id = %ctx.request_id,
            handler_name = %route.handler_name,
            lane = route.workload.as_str(),
            "Request dispatched to handler"
        );
        let future = self.dispatcher.dispatch(&route.handler, args, route.workload);
        self.pending(
            Pending::Dispatched(future),
            progress,
            ctx,
            Some(route.handler_name.clone()),
            started,
        )
    }

    /// Handle and wait.
    pub fn serve(&self, ctx: RequestContext) -> HttpReply {
        self.handle(ctx).wait()
    }

    fn pending(
        &self,
        pending: Pending,
        progress: Progress,
        ctx: RequestContext,
        handler_name: Option<String>,
        started: Instant,
    ) -> PendingResponse {
        let (active, request_number) = ActiveRequest::enter(&self.counters);
        PendingResponse {
            pending,
            meta: RequestMeta {
                progress,
                assembler: self.assembler.clone(),
                method: ctx.method,
                path: ctx.path,
                handler_name,
                started,
                request_number,
                _active: active,
            },
        }
    }
}
